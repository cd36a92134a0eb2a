use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

fn lamp() -> ObjectDescriptor {
    ObjectDescriptor::new("Lamp")
        .with_name("Desk lamp")
        .with_description("A small lamp")
        .with_property("color", "red")
        .with_property("material", "metal")
        .with_variable("powered", "off")
        .with_action(
            Action::new("toggle")
                .with_description("Flip the switch")
                .with_parameters(["state"])
                .bind(Box::new(|args| Ok(args.first().cloned()))),
        )
}

#[test]
fn render_full_includes_all_sections() {
    let lamp = lamp();
    let text = lamp.render_full();

    assert!(text.starts_with("Object 'Desk lamp' (Lamp); "));
    assert!(text.contains(&format!("ID = '{}'; ", lamp.id())));
    assert!(text.contains("Description = 'A small lamp'; "));
    assert!(text.contains("Properties: { 'color' = 'red', 'material' = 'metal' }; "));
    assert!(text.contains("Variables: { 'powered' = 'off' }; "));
    assert!(text.contains("Possible actions: { 'toggle': {"));
    assert!(text.contains("Parameters:  'state'; }"));
}

#[test]
fn render_short_omits_id_variables_and_actions() {
    let lamp = lamp();
    let text = lamp.render_short();

    assert!(text.starts_with("Object 'Desk lamp' (Lamp); "));
    assert!(text.contains("Properties: { 'color' = 'red', 'material' = 'metal' }; "));
    assert!(!text.contains("ID = "));
    assert!(!text.contains("Variables"));
    assert!(!text.contains("Possible actions"));
}

#[test]
fn header_falls_back_to_type_when_name_blank() {
    let anon = ObjectDescriptor::new("Crate").with_name("   ");
    assert!(anon.render_short().starts_with("Object 'Crate'; "));

    let unnamed = ObjectDescriptor::new("Crate");
    assert!(unnamed.render_full().starts_with("Object 'Crate'; "));
}

#[test]
fn empty_sections_are_omitted() {
    let bare = ObjectDescriptor::new("Rock");
    let text = bare.render_full();

    assert!(!text.contains("Properties"));
    assert!(!text.contains("Variables"));
    assert!(!text.contains("Possible actions"));
    assert!(!text.contains("Description"));
}

#[test]
fn activate_regenerates_descriptor_and_action_ids() {
    let mut lamp = lamp();
    let id_before = lamp.id().to_string();
    let action_id_before = lamp.action("toggle").unwrap().id().to_string();

    lamp.activate();

    assert_ne!(lamp.id(), id_before);
    assert_ne!(lamp.action("toggle").unwrap().id(), action_id_before);
}

#[test]
fn two_activations_yield_distinct_ids() {
    let mut lamp = lamp();
    lamp.activate();
    let first = lamp.id().to_string();
    lamp.activate();
    assert_ne!(lamp.id(), first);
}

#[test]
fn variable_set_notifies_observers() {
    let count = std::sync::Arc::new(AtomicUsize::new(0));
    let seen = std::sync::Arc::new(std::sync::Mutex::new(String::new()));

    let mut variable = Variable::new("powered", "off");
    {
        let count = count.clone();
        let seen = seen.clone();
        variable.observe(Box::new(move |value| {
            count.fetch_add(1, Ordering::SeqCst);
            *seen.lock().unwrap() = value.to_string();
        }));
    }

    variable.set("on");
    variable.set("off");

    assert_eq!(count.load(Ordering::SeqCst), 2);
    assert_eq!(*seen.lock().unwrap(), "off");
}

#[test]
fn action_invocation_failure_is_swallowed() {
    let action = Action::new("explode").bind(Box::new(|_| anyhow::bail!("boom")));
    assert_eq!(action.try_invoke(&[]), None);
}

#[test]
fn action_without_callable_returns_none() {
    let action = Action::new("noop");
    assert_eq!(action.try_invoke(&[]), None);
}

#[test]
fn action_invocation_returns_result() {
    let action = Action::new("echo").bind(Box::new(|args| Ok(args.first().cloned())));
    assert_eq!(
        action.try_invoke(&["hello".to_string()]),
        Some("hello".to_string())
    );
}

#[test]
fn action_render_without_parameters_closes_braces() {
    let action = Action::new("wave");
    let text = action.render();
    assert!(text.starts_with("'wave': { ID: '"));
    assert!(text.ends_with(" }"));
    assert!(!text.contains("Parameters"));
}

#[test]
fn action_render_lists_parameters_in_declaration_order() {
    let action = Action::new("move").with_parameters(["dx", "dy"]);
    let text = action.render();
    assert!(text.contains("Parameters:  'dx', 'dy'; }"));
}

#[test]
fn variable_mut_updates_rendered_value() {
    let mut lamp = lamp();
    lamp.variable_mut("powered").unwrap().set("on");
    assert!(lamp.render_full().contains("Variables: { 'powered' = 'on' }; "));
}

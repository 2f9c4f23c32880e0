use super::*;
use serde_json::json;
use shared::domain::{ItemId, Parameter};

fn catalog() -> Vec<Item> {
    vec![Item::new(1, "itemA"), Item::new(2, "itemB")]
}

fn metadata(engine: &str, names: &[&str]) -> ItemMetadata {
    ItemMetadata {
        engine: engine.to_string(),
        parameters: names
            .iter()
            .map(|name| Parameter {
                name: name.to_string(),
            })
            .collect(),
    }
}

fn select(session: &mut OperatorSession, tile: usize) -> SelectionTicket {
    session
        .select_tile(tile)
        .expect("tile exists")
        .expect("ticket")
}

#[test]
fn every_tile_is_bound_to_its_own_item() {
    let mut session = OperatorSession::new();
    let items: Vec<Item> = (0..5).map(|i| Item::new(i, format!("item{i}"))).collect();
    session.load_catalog(items.clone());

    assert_eq!(session.gallery().len(), 5);
    for (tile, item) in items.iter().enumerate() {
        let ticket = select(&mut session, tile);
        assert_eq!(ticket.item(), item);
        assert_eq!(ticket.tile(), tile);
    }
    assert!(session.select_tile(5).is_none());
}

#[test]
fn exactly_one_tile_is_highlighted_after_each_click() {
    let mut session = OperatorSession::new();
    session.load_catalog(catalog());

    for tile in [0, 1, 1, 0] {
        let ticket = select(&mut session, tile);
        session.apply_metadata(&ticket, metadata("E", &[]));
        let marked: Vec<_> = (0..session.gallery().len())
            .filter(|t| session.is_highlighted(*t))
            .collect();
        assert_eq!(marked, vec![tile]);
    }
}

#[test]
fn form_matches_metadata_and_starts_empty() {
    let mut session = OperatorSession::new();
    session.load_catalog(catalog());
    let ticket = select(&mut session, 0);
    session.apply_metadata(&ticket, metadata("PathMaker", &["rotations", "rotate"]));

    let names: Vec<_> = session
        .form()
        .fields()
        .iter()
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(names, ["rotations", "rotate"]);
    assert_eq!(session.form().value("rotations"), Some(""));
    assert_eq!(session.form().value("rotate"), Some(""));
}

#[test]
fn send_data_without_selection_is_refused() {
    let mut session = OperatorSession::new();
    session.load_catalog(catalog());
    let err = session.send_data().expect_err("no selection");
    assert!(matches!(err, ClientError::NoSelection));
    assert_eq!(err.to_string(), "Please select an item first!");
}

#[test]
fn send_data_merges_selection_and_form_values() {
    let mut session = OperatorSession::new();
    session.load_catalog(vec![Item::new("7", "seven")]);
    let ticket = select(&mut session, 0);
    session.apply_metadata(&ticket, metadata("E", &["alpha"]));
    assert!(session.form_mut().set_value("alpha", "3"));

    let payload = session.send_data().expect("payload");
    assert_eq!(payload.item_id, ItemId::from("7"));
    assert_eq!(
        serde_json::to_value(&payload).expect("encode"),
        json!({ "item_id": "7", "engine": "E", "alpha": "3" })
    );
}

#[test]
fn reserved_parameter_names_do_not_override_fixed_fields() {
    let mut session = OperatorSession::new();
    session.load_catalog(catalog());
    let ticket = select(&mut session, 1);
    session.apply_metadata(&ticket, metadata("E", &["engine", "r0"]));
    session.form_mut().set_value("engine", "hijack");
    session.form_mut().set_value("r0", "2");

    assert_eq!(
        serde_json::to_value(session.send_data().expect("payload")).expect("encode"),
        json!({ "item_id": 2, "engine": "E", "r0": "2" })
    );
}

#[test]
fn reselecting_the_same_item_rebuilds_an_empty_form() {
    let mut session = OperatorSession::new();
    session.load_catalog(catalog());

    let first = select(&mut session, 0);
    session.apply_metadata(&first, metadata("PathMaker", &["rotations"]));
    let fresh = session.form().clone();
    session.form_mut().set_value("rotations", "12");

    let again = select(&mut session, 0);
    session.apply_metadata(&again, metadata("PathMaker", &["rotations"]));
    assert_eq!(session.form(), &fresh);
    assert_eq!(session.form().value("rotations"), Some(""));
}

#[test]
fn only_the_latest_click_updates_the_form() {
    let mut session = OperatorSession::new();
    session.load_catalog(catalog());

    let click_a = select(&mut session, 0);
    let click_b = select(&mut session, 1);

    assert_eq!(
        session.apply_metadata(&click_b, metadata("SpiralAboutCenter", &["r0", "r1"])),
        SelectionOutcome::Applied
    );
    assert_eq!(
        session.apply_metadata(&click_a, metadata("PathMaker", &["rotate"])),
        SelectionOutcome::Stale
    );

    let active = session.active().expect("active");
    assert_eq!(active.item().name, "itemB");
    assert_eq!(session.form().len(), 2);
    assert_eq!(session.highlighted_tile(), Some(1));
}

#[test]
fn failed_metadata_keeps_the_previous_form() {
    let mut session = OperatorSession::new();
    session.load_catalog(catalog());
    let first = select(&mut session, 0);
    session.apply_metadata(&first, metadata("PathMaker", &["rotations"]));
    session.form_mut().set_value("rotations", "5");

    let second = select(&mut session, 1);
    assert!(session.is_loading());
    session.reject_metadata(&second);

    assert!(!session.is_loading());
    assert_eq!(session.highlighted_tile(), Some(0));
    assert_eq!(session.form().value("rotations"), Some("5"));
    let payload = session.send_data().expect("payload");
    assert_eq!(payload.value("rotations"), Some("5"));
}

#[test]
fn reloading_the_catalog_invalidates_earlier_clicks() {
    let mut session = OperatorSession::new();
    session.load_catalog(catalog());
    let before_reload = select(&mut session, 0);

    session.load_catalog(vec![Item::new(5, "itemE")]);
    assert!(session.highlighted_tile().is_none());
    assert!(session.active().is_none());

    let after_reload = select(&mut session, 0);
    assert_eq!(
        session.apply_metadata(&before_reload, metadata("PathMaker", &["rotate"])),
        SelectionOutcome::Stale
    );
    assert_eq!(
        session.apply_metadata(&after_reload, metadata("E", &["x"])),
        SelectionOutcome::Applied
    );
    assert_eq!(session.active().expect("active").item().name, "itemE");
}

#[test]
fn send_data_waits_for_a_newer_click_to_load() {
    let mut session = OperatorSession::new();
    session.load_catalog(catalog());
    let first = select(&mut session, 0);
    session.apply_metadata(&first, metadata("PathMaker", &["rotations"]));

    let second = select(&mut session, 1);
    assert_eq!(session.highlighted_tile(), Some(1));
    let err = session.send_data().expect_err("itemB still loading");
    assert!(matches!(err, ClientError::SelectionPending { ref item } if item == "itemB"));

    session.apply_metadata(&second, metadata("SpiralAboutCenter", &["r0"]));
    let payload = session.send_data().expect("payload");
    assert_eq!(payload.item_id, ItemId::from(2));
    assert_eq!(payload.engine, "SpiralAboutCenter");
}

use garden_core::db::{open_db, open_db_in_memory};
use garden_core::repo::snapshot::{BEDS_KEY, PLANTS_KEY};
use garden_core::{
    Action, ActionError, EventKind, FrostDates, GardenState, KeyValueRepository, PlannerError,
    PlannerService, RepoError, SqliteKeyValueRepository,
};

fn frost() -> FrostDates {
    FrostDates::for_year(2024)
}

fn assign(bed: &str, row: usize, col: usize, plant: &str, date: Option<&str>) -> Action {
    Action::AssignPlant {
        bed: bed.to_string(),
        row,
        col,
        plant: plant.to_string(),
        date: date.map(str::to_string),
    }
}

#[test]
fn empty_store_loads_defaults_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKeyValueRepository::try_new(&conn).unwrap();
    let service = PlannerService::load(repo, frost()).unwrap();

    assert_eq!(service.state(), &GardenState::with_defaults(frost()));
    let names = service
        .state()
        .plants()
        .iter()
        .map(|plant| plant.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Broccoli", "Tomato", "Lettuce", "Carrot"]);

    let repo = SqliteKeyValueRepository::try_new(&conn).unwrap();
    assert!(repo.keys().unwrap().is_empty());
}

#[test]
fn corrupt_snapshots_fall_back_to_defaults() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKeyValueRepository::try_new(&conn).unwrap();
    repo.put(PLANTS_KEY, "{not json").unwrap();
    repo.put(BEDS_KEY, r#"[{"name":"Broken","grid":[]}]"#).unwrap();

    let service = PlannerService::load(repo, frost()).unwrap();
    assert_eq!(service.state(), &GardenState::with_defaults(frost()));
}

#[test]
fn one_corrupt_entry_does_not_discard_the_other() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKeyValueRepository::try_new(&conn).unwrap();
    repo.put(PLANTS_KEY, "42").unwrap();
    repo.put(
        BEDS_KEY,
        r#"[{"name":"Herbs","grid":[[{"plant":"Basil","date":"2024-05-20"}]]}]"#,
    )
    .unwrap();

    let service = PlannerService::load(repo, frost()).unwrap();
    assert_eq!(service.state().bed_names(), vec!["Herbs"]);
    assert!(service.state().plants().contains("Tomato"));
}

#[test]
fn dispatch_persists_and_reload_restores_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garden.db");

    let expected = {
        let conn = open_db(&path).unwrap();
        let repo = SqliteKeyValueRepository::try_new(&conn).unwrap();
        let mut service = PlannerService::load(repo, frost()).unwrap();
        service.dispatch(assign("Main Bed", 0, 0, "Tomato", Some("2024-05-15"))).unwrap();
        service.dispatch(assign("Main Bed", 1, 2, "Okra", None)).unwrap();
        service
            .dispatch(Action::AddBed {
                name: Some("Herbs".to_string()),
                rows: Some(2),
                cols: Some(2),
            })
            .unwrap();
        service
            .dispatch(Action::SetSquareNote {
                bed: "Main Bed".to_string(),
                row: 0,
                col: 0,
                note: "stake early".to_string(),
            })
            .unwrap();
        service.into_state()
    };

    let conn = open_db(&path).unwrap();
    let repo = SqliteKeyValueRepository::try_new(&conn).unwrap();
    let reloaded = PlannerService::load(repo, frost()).unwrap();
    assert_eq!(reloaded.state(), &expected);
    assert!(reloaded.state().plants().contains("Okra"));
    let record = reloaded.bed("Main Bed").and_then(|bed| bed.get(0, 0)).unwrap();
    assert_eq!(record.note, "stake early");
}

#[test]
fn rejected_action_changes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKeyValueRepository::try_new(&conn).unwrap();
    let mut service = PlannerService::load(repo, frost()).unwrap();
    let before = service.state().clone();

    let err = service
        .dispatch(Action::DeleteBed {
            bed: "Main Bed".to_string(),
        })
        .unwrap_err();
    assert_eq!(err, ActionError::LastBed("Main Bed".to_string()));
    assert_eq!(service.state(), &before);
    assert_eq!(service.state().beds().len(), 1);

    let repo = SqliteKeyValueRepository::try_new(&conn).unwrap();
    assert_eq!(repo.get(BEDS_KEY).unwrap(), None);
}

#[test]
fn frost_change_does_not_touch_snapshots() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKeyValueRepository::try_new(&conn).unwrap();
    let mut service = PlannerService::load(repo, frost()).unwrap();

    service
        .dispatch(Action::SetFrostDates {
            spring: Some("2024-05-05".to_string()),
            fall: None,
        })
        .unwrap();
    assert_eq!(service.state().frost().spring_iso(), "2024-05-05");

    let repo = SqliteKeyValueRepository::try_new(&conn).unwrap();
    assert!(repo.keys().unwrap().is_empty());
}

#[test]
fn calendar_reflects_current_state() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKeyValueRepository::try_new(&conn).unwrap();
    let mut service = PlannerService::load(repo, frost()).unwrap();

    service.dispatch(assign("Main Bed", 0, 0, "Tomato", Some("2024-05-15"))).unwrap();
    let calendar = service.calendar();
    assert_eq!(calendar.dates(), vec!["2024-03-20", "2024-05-15"]);
    assert_eq!(calendar.events_on("2024-03-20")[0].kind, EventKind::IndoorStart);

    service
        .dispatch(Action::ClearSquare {
            bed: "Main Bed".to_string(),
            row: 0,
            col: 0,
        })
        .unwrap();
    assert!(service.calendar().is_empty());
}

#[test]
fn succession_schedule_uses_fall_frost_cutoff() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKeyValueRepository::try_new(&conn).unwrap();
    let mut service = PlannerService::load(repo, frost()).unwrap();

    service.dispatch(assign("Main Bed", 0, 0, "Lettuce", None)).unwrap();
    service.dispatch(assign("Main Bed", 0, 1, "Tomato", None)).unwrap();

    let entries = service.successions();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!((entry.bed.as_str(), entry.row, entry.col), ("Main Bed", 0, 0));
    assert_eq!(entry.plant, "Lettuce");
    assert_eq!(entry.planted, garden_core::parse_date("2024-04-16").unwrap());
    assert_eq!(entry.dates.len(), 3);
    assert!(entry.dates.iter().all(|date| *date < frost().fall));

    let with_successions = service.calendar_with_successions();
    assert_eq!(
        with_successions.event_count(),
        service.calendar().event_count() + 3
    );
}

#[test]
fn open_requires_a_migrated_connection() {
    let raw = rusqlite::Connection::open_in_memory().unwrap();
    let err = PlannerService::open(&raw, frost()).err().unwrap();
    assert!(matches!(
        err,
        PlannerError::Repo(RepoError::SchemaMismatch { found: 0, .. })
    ));

    let conn = open_db_in_memory().unwrap();
    let service = PlannerService::open(&conn, frost()).unwrap();
    assert_eq!(service.state().bed_names(), vec!["Main Bed"]);
}

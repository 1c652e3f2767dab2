//! Configuration file and tracing bootstrap

use ban::{init_tracing, BanConfig, Contact, Database, Registry, CONFIG_FILE_NAME};
use tempfile::TempDir;

#[test]
fn open_writes_default_config() {
    let dir = TempDir::new().unwrap();
    let db = Database::open(dir.path()).unwrap();

    let written = std::fs::read_to_string(dir.path().join(CONFIG_FILE_NAME)).unwrap();
    assert_eq!(written, BanConfig::default_toml());
    assert_eq!(db.config(), BanConfig::default());
}

#[test]
fn include_deleted_from_file_drives_export() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        "log_filter = \"warn\"\n[export]\ninclude_deleted = true\n",
    )
    .unwrap();
    let registry = Registry::new(Database::open(dir.path()).unwrap());
    let actor = ban::Actor::new("config");

    let mut contact = Contact::new("Jeanne", "jeanne@example.org");
    registry.create(&actor, &mut contact).unwrap();
    registry.mark_deleted(&actor, &mut contact).unwrap();

    assert_eq!(registry.export::<Contact>().unwrap().len(), 1);
    assert!(registry.list::<Contact>().unwrap().is_empty());
}

#[test]
fn bad_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        "transaction_timeout_ms = \"soon\"\n",
    )
    .unwrap();
    assert!(Database::open(dir.path()).unwrap_err().is_validation());
}

#[test]
fn tracing_init_never_panics() {
    let config = BanConfig::default();
    let _ = init_tracing(&config);
    assert!(init_tracing(&config).is_err());
}

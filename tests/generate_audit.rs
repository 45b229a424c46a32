//! Generation writes documents that audit cleanly; tampering is caught.

use fingermatch::assembler::{Layout, PrivateInputs, COMBINED_FILE, PRIVATE_FILE, PUBLIC_FILE};
use fingermatch::audit::{self, AuditArgs, Subject};
use fingermatch::generate::{self, GenerateArgs};
use fingermatch::record::DB_SIZE;

fn generate_into(dir: &std::path::Path, layout: Layout) {
    generate::run(&GenerateArgs {
        out_dir: dir.to_path_buf(),
        layout,
        plant_match: Some(1),
    })
    .unwrap();
}

#[test]
fn split_layout_round_trips_through_audit() {
    let dir = tempfile::tempdir().unwrap();
    generate_into(dir.path(), Layout::Split);
    assert!(dir.path().join(PUBLIC_FILE).is_file());
    assert!(dir.path().join(PRIVATE_FILE).is_file());

    let report = audit::run(&AuditArgs {
        dir: dir.path().to_path_buf(),
    })
    .unwrap();
    assert_eq!(report.entries.len(), DB_SIZE + 1);
    assert!(report.all_valid());
}

#[test]
fn combined_layout_round_trips_through_audit() {
    let dir = tempfile::tempdir().unwrap();
    generate_into(dir.path(), Layout::Combined);
    assert!(dir.path().join(COMBINED_FILE).is_file());
    assert!(!dir.path().join(PUBLIC_FILE).exists());

    let report = audit::run(&AuditArgs {
        dir: dir.path().to_path_buf(),
    })
    .unwrap();
    assert!(report.all_valid());
}

#[test]
fn tampered_signature_fails_audit() {
    let dir = tempfile::tempdir().unwrap();
    generate_into(dir.path(), Layout::Split);

    let path = dir.path().join(PRIVATE_FILE);
    let mut private: PrivateInputs = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    private.db_signatures.swap(2, 3);
    std::fs::write(&path, serde_json::to_vec(&private).unwrap()).unwrap();

    let report = audit::run(&AuditArgs {
        dir: dir.path().to_path_buf(),
    })
    .unwrap();
    let failed: Vec<_> = report.failures().map(|e| e.subject).collect();
    assert_eq!(failed, [Subject::Database(2), Subject::Database(3)]);
}

//! Directory persistence across restarts
//! Run with: cargo test --test brain_test

use std::sync::Arc;

use jarvis::application::services::Directory;
use jarvis::domain::traits::Brain;
use jarvis::infrastructure::config::{BrainConfig, BrainMode};
use jarvis::infrastructure::storage::{load_directory, open_brain, BrainWriter};

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("jarvis-{}-{}", name, uuid::Uuid::new_v4()))
}

async fn populate(brain: Arc<dyn Brain>) {
    let directory = Directory::new();
    let (writer, task) = BrainWriter::spawn(brain);
    directory.subscribe(writer).unwrap();

    directory.add_user("alex").unwrap();
    directory.add_identity("alex", "irc@alex").unwrap();
    directory.add_user("paul").unwrap();
    directory.add_group("ops").unwrap();
    directory.add_group_user("ops", "alex").unwrap();
    directory.add_group_user("ops", "paul").unwrap();
    directory.add_group_permission("ops", "admin:*").unwrap();
    directory.delete_user("paul").unwrap();

    drop(directory);
    task.await.unwrap();
}

async fn assert_restored(brain: &dyn Brain) {
    let directory = Directory::new();
    load_directory(brain, &directory).await.unwrap();

    let users: Vec<String> = directory.users().unwrap().into_iter().map(|u| u.name).collect();
    assert_eq!(users, vec!["alex"]);
    assert_eq!(
        directory.user_for_identity("irc@alex").unwrap().map(|u| u.name),
        Some("alex".to_string())
    );

    let ops = directory.find_group("ops").unwrap();
    assert_eq!(ops.users, vec!["alex"]);
    assert!(ops.has_permission("admin:restart"));
}

#[tokio::test]
async fn test_json_brain_survives_restart() {
    let config = BrainConfig {
        mode: BrainMode::Json,
        path: temp_path("json"),
    };

    populate(open_brain(&config).await.unwrap()).await;
    assert!(config.path.join("users.json").exists());
    assert!(config.path.join("groups.json").exists());

    let brain = open_brain(&config).await.unwrap();
    assert_restored(brain.as_ref()).await;

    let _ = std::fs::remove_dir_all(&config.path);
}

#[tokio::test]
async fn test_sqlite_brain_survives_restart() {
    let dir = temp_path("sqlite");
    let config = BrainConfig {
        mode: BrainMode::Sqlite,
        path: dir.join("brain.db"),
    };

    populate(open_brain(&config).await.unwrap()).await;

    let brain = open_brain(&config).await.unwrap();
    assert_restored(brain.as_ref()).await;

    drop(brain);
    let _ = std::fs::remove_dir_all(&dir);
}

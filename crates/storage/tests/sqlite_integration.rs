use chrono::Duration;
use storage::repository::{
    ExamConfigRepository, MaterialRepository, NewMaterialRecord, NewStudySessionRecord,
    StorageError, StudySessionRepository,
};
use storage::sqlite::SqliteRepository;
use tutor_core::model::{
    DifficultyLevel, ExamConfigDraft, ExamType, MaterialId, MaterialKind, Mode, ProgressAction,
    ProgressState,
};
use tutor_core::time::fixed_now;

async fn connect(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn record(title: &str, kind: MaterialKind, text: &str) -> NewMaterialRecord {
    NewMaterialRecord {
        title: title.into(),
        kind,
        page_count: Some(4),
        text: text.into(),
    }
}

#[tokio::test]
async fn sqlite_roundtrips_materials_by_kind() {
    let repo = connect("memdb_materials").await;

    let book = repo
        .insert_material(record("Biology 101", MaterialKind::Study, "Cells and more cells"))
        .await
        .unwrap();
    repo.insert_material(record("June Paper", MaterialKind::Exam, "Q1. Define osmosis."))
        .await
        .unwrap();

    let fetched = repo.get_material(book).await.unwrap();
    assert_eq!(fetched.title(), "Biology 101");
    assert_eq!(fetched.kind(), MaterialKind::Study);
    assert_eq!(fetched.page_count(), Some(4));
    assert_eq!(fetched.text(), "Cells and more cells");

    let exams = repo.list_materials(Some(MaterialKind::Exam)).await.unwrap();
    assert_eq!(exams.len(), 1);
    assert_eq!(exams[0].title(), "June Paper");
    assert_eq!(repo.list_materials(None).await.unwrap().len(), 2);

    assert!(matches!(
        repo.get_material(MaterialId::new(999)).await,
        Err(StorageError::NotFound)
    ));
}

#[tokio::test]
async fn sqlite_exam_config_replaces_on_save() {
    let repo = connect("memdb_exam_config").await;
    let book = repo
        .insert_material(record("Biology 101", MaterialKind::Study, "text"))
        .await
        .unwrap();

    let first = ExamConfigDraft {
        exam_type: ExamType::Essay,
        learning_objectives: vec!["Explain osmosis".into()],
        time_constraints: Some(60),
        ..ExamConfigDraft::default()
    }
    .validate()
    .unwrap();
    let second = ExamConfigDraft {
        exam_type: ExamType::MultipleChoice,
        difficulty_level: DifficultyLevel::Beginner,
        ..ExamConfigDraft::default()
    }
    .validate()
    .unwrap();

    repo.save_exam_config(book, &first).await.unwrap();
    assert_eq!(repo.get_exam_config(book).await.unwrap(), Some(first));

    repo.save_exam_config(book, &second).await.unwrap();
    assert_eq!(repo.get_exam_config(book).await.unwrap(), Some(second.clone()));

    assert!(matches!(
        repo.save_exam_config(MaterialId::new(404), &second).await,
        Err(StorageError::NotFound)
    ));

    repo.clear_exam_config(book).await.unwrap();
    assert_eq!(repo.get_exam_config(book).await.unwrap(), None);
}

#[tokio::test]
async fn sqlite_sessions_are_listed_in_order_and_cascade() {
    let repo = connect("memdb_sessions").await;
    let book = repo
        .insert_material(record("Biology 101", MaterialKind::Study, "text"))
        .await
        .unwrap();

    let progress = ProgressState::new()
        .apply(&ProgressAction::question_answered(false, "osmosis"))
        .apply(&ProgressAction::topic_studied("cells"));
    let start = fixed_now();

    let later = repo
        .append_session(NewStudySessionRecord {
            material_id: book,
            mode: Mode::Quiz,
            started_at: start + Duration::hours(2),
            ended_at: start + Duration::hours(3),
            progress: progress.to_record(),
        })
        .await
        .unwrap();
    let earlier = repo
        .append_session(NewStudySessionRecord {
            material_id: book,
            mode: Mode::Learn,
            started_at: start,
            ended_at: start + Duration::minutes(25),
            progress: ProgressState::new().to_record(),
        })
        .await
        .unwrap();

    let sessions = repo.list_sessions(book).await.unwrap();
    assert_eq!(sessions.iter().map(|s| s.id).collect::<Vec<_>>(), vec![earlier, later]);
    assert_eq!(sessions[0].duration_minutes(), 25);
    assert_eq!(sessions[1].mode, Mode::Quiz);
    assert_eq!(sessions[1].progress.clone().into_state().unwrap(), progress);

    repo.delete_material(book).await.unwrap();
    assert!(repo.list_sessions(book).await.unwrap().is_empty());
    assert!(matches!(
        repo.delete_material(book).await,
        Err(StorageError::NotFound)
    ));
}

#[tokio::test]
async fn sqlite_rejects_session_for_missing_material() {
    let repo = connect("memdb_orphan_session").await;
    let err = repo
        .append_session(NewStudySessionRecord {
            material_id: MaterialId::new(77),
            mode: Mode::Learn,
            started_at: fixed_now(),
            ended_at: fixed_now(),
            progress: ProgressState::new().to_record(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

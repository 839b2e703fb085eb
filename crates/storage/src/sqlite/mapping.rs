use formation_core::model::{
    Choice, ChoiceId, Content, ContentId, ContentKind, ContentLocation, Formation, FormationId,
    LearnerId, Module, ModuleId, PassThreshold, Question, QuestionId, QuizId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::{GradedAttemptRecord, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn formation_id_from_i64(v: i64) -> Result<FormationId, StorageError> {
    Ok(FormationId::new(i64_to_u64("formation_id", v)?))
}

pub(crate) fn module_id_from_i64(v: i64) -> Result<ModuleId, StorageError> {
    Ok(ModuleId::new(i64_to_u64("module_id", v)?))
}

pub(crate) fn content_id_from_i64(v: i64) -> Result<ContentId, StorageError> {
    Ok(ContentId::new(i64_to_u64("content_id", v)?))
}

pub(crate) fn quiz_id_from_i64(v: i64) -> Result<QuizId, StorageError> {
    Ok(QuizId::new(i64_to_u64("quiz_id", v)?))
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    Ok(QuestionId::new(i64_to_u64("question_id", v)?))
}

pub(crate) fn choice_id_from_i64(v: i64) -> Result<ChoiceId, StorageError> {
    Ok(ChoiceId::new(i64_to_u64("choice_id", v)?))
}

pub(crate) fn learner_id_from_i64(v: i64) -> Result<LearnerId, StorageError> {
    Ok(LearnerId::new(i64_to_u64("learner_id", v)?))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn map_formation_row(row: &SqliteRow) -> Result<Formation, StorageError> {
    Formation::new(
        formation_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<Option<String>, _>("description").map_err(ser)?,
        row.try_get::<Option<String>, _>("kind").map_err(ser)?,
        u32_from_i64(
            "duration_minutes",
            row.try_get::<i64, _>("duration_minutes").map_err(ser)?,
        )?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_module_row(row: &SqliteRow) -> Result<Module, StorageError> {
    Module::new(
        module_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        formation_id_from_i64(row.try_get::<i64, _>("formation_id").map_err(ser)?)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<Option<String>, _>("description").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_content_row(row: &SqliteRow) -> Result<Content, StorageError> {
    // kind labels pass through the same normalization legacy imports use
    let kind = ContentKind::from_label(&row.try_get::<String, _>("kind").map_err(ser)?)
        .map_err(ser)?;
    let location = ContentLocation::parse(&row.try_get::<String, _>("location").map_err(ser)?)
        .map_err(ser)?;

    Content::new(
        content_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        module_id_from_i64(row.try_get::<i64, _>("module_id").map_err(ser)?)?,
        kind,
        row.try_get::<String, _>("title").map_err(ser)?,
        u32_from_i64(
            "duration_minutes",
            row.try_get::<i64, _>("duration_minutes").map_err(ser)?,
        )?,
        location,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn pass_threshold_from_i64(v: i64) -> Result<PassThreshold, StorageError> {
    let value = u32_from_i64("pass_threshold", v)?;
    PassThreshold::new(value).map_err(ser)
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<Question, StorageError> {
    Ok(Question {
        id: question_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        quiz_id: quiz_id_from_i64(row.try_get::<i64, _>("quiz_id").map_err(ser)?)?,
        text: row.try_get("text").map_err(ser)?,
        choices: Vec::new(),
    })
}

pub(crate) fn map_choice_row(row: &SqliteRow) -> Result<Choice, StorageError> {
    Ok(Choice {
        id: choice_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        question_id: question_id_from_i64(row.try_get::<i64, _>("question_id").map_err(ser)?)?,
        text: row.try_get("text").map_err(ser)?,
        is_correct: row.try_get::<i64, _>("is_correct").map_err(ser)? != 0,
    })
}

pub(crate) fn map_attempt_row(row: &SqliteRow) -> Result<GradedAttemptRecord, StorageError> {
    let percentage_i64: i64 = row.try_get("percentage").map_err(ser)?;
    let percentage = u8::try_from(percentage_i64)
        .map_err(|_| StorageError::Serialization(format!("invalid percentage: {percentage_i64}")))?;

    Ok(GradedAttemptRecord {
        id: Some(row.try_get("id").map_err(ser)?),
        quiz_id: quiz_id_from_i64(row.try_get::<i64, _>("quiz_id").map_err(ser)?)?,
        learner_id: learner_id_from_i64(row.try_get::<i64, _>("learner_id").map_err(ser)?)?,
        score: u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?,
        total_questions: u32_from_i64(
            "total_questions",
            row.try_get::<i64, _>("total_questions").map_err(ser)?,
        )?,
        percentage,
        passed: row.try_get::<i64, _>("passed").map_err(ser)? != 0,
        submitted_at: row.try_get("submitted_at").map_err(ser)?,
    })
}

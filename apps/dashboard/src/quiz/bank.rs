//! Admin-authored question bank.

use serde::Deserialize;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::quiz::QuizQuestionRow;

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionInput {
    pub question_text: String,
    pub choices: [String; 4],
    pub correct_answer: i16,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub is_public: bool,
    pub article_id: Option<i64>,
}

impl QuestionInput {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.question_text.trim().is_empty() {
            return Err(AppError::Validation("question_text cannot be empty".into()));
        }
        if let Some(i) = self.choices.iter().position(|c| c.trim().is_empty()) {
            return Err(AppError::Validation(format!("choice {i} cannot be empty")));
        }
        if !(0..=3).contains(&self.correct_answer) {
            return Err(AppError::Validation(
                "correct_answer must be between 0 and 3".into(),
            ));
        }
        Ok(())
    }
}

pub async fn list_questions(pool: &PgPool) -> sqlx::Result<Vec<QuizQuestionRow>> {
    sqlx::query_as::<_, QuizQuestionRow>("SELECT * FROM quiz_questions ORDER BY id")
        .fetch_all(pool)
        .await
}

pub async fn get_question(pool: &PgPool, id: i64) -> sqlx::Result<Option<QuizQuestionRow>> {
    sqlx::query_as::<_, QuizQuestionRow>("SELECT * FROM quiz_questions WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_by_article(pool: &PgPool, article_id: i64) -> sqlx::Result<Vec<QuizQuestionRow>> {
    sqlx::query_as::<_, QuizQuestionRow>(
        "SELECT * FROM quiz_questions WHERE article_id = $1 ORDER BY id",
    )
    .bind(article_id)
    .fetch_all(pool)
    .await
}

pub async fn create_question(pool: &PgPool, input: &QuestionInput) -> Result<i64, AppError> {
    input.validate()?;
    let [c0, c1, c2, c3] = &input.choices;
    let id = sqlx::query_scalar(
        r#"
        INSERT INTO quiz_questions
            (question_text, choice0, choice1, choice2, choice3, correct_answer,
             explanation, is_public, article_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id
        "#,
    )
    .bind(input.question_text.trim())
    .bind(c0)
    .bind(c1)
    .bind(c2)
    .bind(c3)
    .bind(input.correct_answer)
    .bind(&input.explanation)
    .bind(input.is_public)
    .bind(input.article_id)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Returns `false` when the question does not exist.
pub async fn update_question(pool: &PgPool, id: i64, input: &QuestionInput) -> Result<bool, AppError> {
    input.validate()?;
    let [c0, c1, c2, c3] = &input.choices;
    let affected = sqlx::query(
        r#"
        UPDATE quiz_questions
        SET question_text = $1, choice0 = $2, choice1 = $3, choice2 = $4, choice3 = $5,
            correct_answer = $6, explanation = $7, is_public = $8, article_id = $9
        WHERE id = $10
        "#,
    )
    .bind(input.question_text.trim())
    .bind(c0)
    .bind(c1)
    .bind(c2)
    .bind(c3)
    .bind(input.correct_answer)
    .bind(&input.explanation)
    .bind(input.is_public)
    .bind(input.article_id)
    .bind(id)
    .execute(pool)
    .await?
    .rows_affected();
    Ok(affected > 0)
}

/// Deleting a question cascades to every user's card and review history.
pub async fn delete_question(pool: &PgPool, id: i64) -> sqlx::Result<bool> {
    let affected = sqlx::query("DELETE FROM quiz_questions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(affected > 0)
}

//! Assessment scores recorded against an enrollment.

use rusqlite::{Connection, OptionalExtension};
use reg_core::{AssessmentId, EnrollmentId, Error, Result};

use crate::integrity::{self, DeleteReport, Entity};
use crate::models::Assessment;
use crate::support::{
    check_opt_timestamp, check_required, db_err, immediate, now, ChangeSet, SHORT_TEXT,
};

const COLS: &str = "id, enrollment_id, assessment_type, score, total_score, given_at, remarks, \
                    created_at, modified_at";

#[derive(Debug, Clone)]
pub struct NewAssessment {
    pub enrollment_id: EnrollmentId,
    pub assessment_type: String,
    pub score: Option<f64>,
    pub total_score: Option<f64>,
    pub given_at: Option<String>,
    pub remarks: String,
}

#[derive(Debug, Clone, Default)]
pub struct AssessmentChanges {
    pub assessment_type: Option<String>,
    pub score: Option<Option<f64>>,
    pub total_score: Option<Option<f64>>,
    pub given_at: Option<Option<String>>,
    pub remarks: Option<String>,
}

/// Scores are non-negative and a score never exceeds its total.
fn check_scores(score: Option<f64>, total: Option<f64>) -> Result<()> {
    for (field, value) in [("score", score), ("total_score", total)] {
        if let Some(v) = value {
            if !v.is_finite() || v < 0.0 {
                return Err(Error::Validation(format!(
                    "{field} must be a non-negative number, got {v}"
                )));
            }
        }
    }
    if let (Some(s), Some(t)) = (score, total) {
        if s > t {
            return Err(Error::Validation(format!(
                "score {s} exceeds total_score {t}"
            )));
        }
    }
    Ok(())
}

pub fn create_assessment(conn: &Connection, new: &NewAssessment) -> Result<Assessment> {
    check_required("assessment_type", &new.assessment_type, SHORT_TEXT)?;
    check_scores(new.score, new.total_score)?;
    check_opt_timestamp("given_at", new.given_at.as_deref())?;

    immediate(conn, |tx| {
        integrity::ensure_exists(tx, Entity::Enrollment, new.enrollment_id.get())?;

        let now = now();
        tx.execute(
            "INSERT INTO assessments (enrollment_id, assessment_type, score, total_score,
                                      given_at, remarks, created_at, modified_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            rusqlite::params![
                new.enrollment_id.get(),
                new.assessment_type,
                new.score,
                new.total_score,
                new.given_at,
                new.remarks,
                now,
            ],
        )
        .map_err(db_err)?;

        Ok(Assessment {
            id: AssessmentId::from(tx.last_insert_rowid()),
            enrollment_id: new.enrollment_id,
            assessment_type: new.assessment_type.clone(),
            score: new.score,
            total_score: new.total_score,
            given_at: new.given_at.clone(),
            remarks: new.remarks.clone(),
            created_at: now.clone(),
            modified_at: now,
        })
    })
}

pub fn get_assessment(conn: &Connection, id: AssessmentId) -> Result<Option<Assessment>> {
    let q = format!("SELECT {COLS} FROM assessments WHERE id = ?1");
    conn.query_row(&q, [id.get()], Assessment::from_row)
        .optional()
        .map_err(db_err)
}

/// List assessments, optionally only those of one enrollment.
pub fn list_assessments(
    conn: &Connection,
    enrollment: Option<EnrollmentId>,
) -> Result<Vec<Assessment>> {
    let q = format!(
        "SELECT {COLS} FROM assessments
         WHERE (?1 IS NULL OR enrollment_id = ?1) ORDER BY id ASC"
    );
    let mut stmt = conn.prepare(&q).map_err(db_err)?;
    let rows = stmt
        .query_map([enrollment.map(|id| id.get())], Assessment::from_row)
        .map_err(db_err)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(db_err)?;
    Ok(rows)
}

/// Apply `changes`. Score checks run against the merged record so a partial
/// update cannot push `score` above the stored `total_score`.
pub fn update_assessment(
    conn: &Connection,
    id: AssessmentId,
    changes: &AssessmentChanges,
) -> Result<Assessment> {
    if let Some(kind) = &changes.assessment_type {
        check_required("assessment_type", kind, SHORT_TEXT)?;
    }
    if let Some(given) = &changes.given_at {
        check_opt_timestamp("given_at", given.as_deref())?;
    }

    immediate(conn, |tx| {
        let current = get_assessment(tx, id)?.ok_or_else(|| Error::not_found("assessment", id))?;
        check_scores(
            changes.score.unwrap_or(current.score),
            changes.total_score.unwrap_or(current.total_score),
        )?;

        let mut set = ChangeSet::new();
        set.set("assessment_type", changes.assessment_type.clone());
        set.set_nullable("score", changes.score);
        set.set_nullable("total_score", changes.total_score);
        set.set_nullable("given_at", changes.given_at.clone());
        set.set("remarks", changes.remarks.clone());
        set.apply(tx, "assessments", "id", id.get()).map_err(db_err)?;

        get_assessment(tx, id)?.ok_or_else(|| Error::not_found("assessment", id))
    })
}

pub fn delete_assessment(conn: &Connection, id: AssessmentId) -> Result<DeleteReport> {
    integrity::delete_entity(conn, Entity::Assessment, id.get())
}

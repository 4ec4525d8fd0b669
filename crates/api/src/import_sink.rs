//! Database-backed [`ImportSink`] and the reference data imports validate
//! against.

use async_trait::async_trait;
use sqlx::PgPool;
use studioplan_core::error::CoreError;
use studioplan_core::import::{AllocationDraft, ImportSink, PersonRef, ProjectDraft, ReferenceData};
use studioplan_core::project::COMMON_CURRENCIES;
use studioplan_core::types::DbId;
use studioplan_db::models::allocation::UpsertAllocation;
use studioplan_db::models::office::Office;
use studioplan_db::models::person::Person;
use studioplan_db::models::project::CreateProject;
use studioplan_db::repositories::{
    AllocationRepo, OfficeRepo, PersonRepo, ProjectRepo, ProjectStageRepo,
};

/// Writes import rows through the repositories, resolving office and
/// manager names against a snapshot taken when the sink was loaded.
pub struct DbImportSink {
    pool: PgPool,
    offices: Vec<Office>,
    people: Vec<Person>,
}

fn to_core(err: sqlx::Error) -> CoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            CoreError::Conflict(format!(
                "duplicate value ({})",
                db_err.constraint().unwrap_or("unique constraint")
            ))
        }
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23514") => {
            CoreError::Validation(format!(
                "value rejected by {}",
                db_err.constraint().unwrap_or("check constraint")
            ))
        }
        _ => CoreError::Internal(err.to_string()),
    }
}

fn find_by_name<'a, T>(items: &'a [T], name: &str, key: impl Fn(&T) -> &str) -> Option<&'a T> {
    let wanted = name.trim().to_lowercase();
    items.iter().find(|item| key(item).trim().to_lowercase() == wanted)
}

impl DbImportSink {
    /// Snapshot offices and people for name resolution.
    pub async fn load(pool: &PgPool) -> Result<Self, sqlx::Error> {
        Ok(Self {
            pool: pool.clone(),
            offices: OfficeRepo::list(pool).await?,
            people: PersonRepo::list(pool, None).await?,
        })
    }

    /// Known offices, managers, currencies and codes for row validation.
    pub async fn reference_data(&self) -> Result<ReferenceData, sqlx::Error> {
        let mut currencies: Vec<String> = COMMON_CURRENCIES.iter().map(|c| c.to_string()).collect();
        for office in &self.offices {
            if !currencies.contains(&office.currency) {
                currencies.push(office.currency.clone());
            }
        }

        Ok(ReferenceData {
            offices: self.offices.iter().map(|o| o.name.clone()).collect(),
            managers: self.people.iter().map(|p| p.name.clone()).collect(),
            currencies,
            existing_codes: ProjectRepo::list_codes(&self.pool).await?,
        })
    }

    /// People as the matrix importer sees them.
    pub fn people(&self) -> Vec<PersonRef> {
        self.people
            .iter()
            .map(|p| PersonRef {
                id: p.id,
                name: p.name.clone(),
                weekly_capacity: Some(p.weekly_capacity),
            })
            .collect()
    }

    fn office_id(&self, name: Option<&str>) -> Option<DbId> {
        find_by_name(&self.offices, name?, |o| o.name.as_str()).map(|o| o.id)
    }

    fn manager_id(&self, name: Option<&str>) -> Option<DbId> {
        find_by_name(&self.people, name?, |p| p.name.as_str()).map(|p| p.id)
    }
}

#[async_trait]
impl ImportSink for DbImportSink {
    async fn create_project(&self, draft: &ProjectDraft) -> Result<DbId, CoreError> {
        let input = CreateProject {
            code: draft.code.clone(),
            name: draft.name.clone(),
            status: Some(draft.status),
            currency: Some(draft.currency.clone()),
            target_profit_pct: Some(draft.target_profit_pct),
            office_id: self.office_id(draft.office.as_deref()),
            manager_id: self.manager_id(draft.manager.as_deref()),
            stages: draft.stages.clone(),
        };
        let project = ProjectRepo::create(&self.pool, &input)
            .await
            .map_err(to_core)?;

        if !draft.stages.is_empty() {
            ProjectStageRepo::create_many(&self.pool, project.id, &draft.stages)
                .await
                .map_err(to_core)?;
        }
        Ok(project.id)
    }

    async fn find_project_by_code(&self, code: &str) -> Result<Option<DbId>, CoreError> {
        Ok(ProjectRepo::find_by_code(&self.pool, code)
            .await
            .map_err(to_core)?
            .map(|p| p.id))
    }

    async fn upsert_allocation(&self, draft: &AllocationDraft) -> Result<(), CoreError> {
        AllocationRepo::upsert(&self.pool, &UpsertAllocation::from(draft))
            .await
            .map_err(to_core)?;
        Ok(())
    }
}

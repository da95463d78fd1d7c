use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    entities::{area, cell, enterprise, line, site},
    errors::ServiceError,
    events::{Event, EventSender},
};

/// CRUD over the ISA-95 plant hierarchy.
///
/// Creation of a child level resolves its parent first and scans siblings for
/// a name collision; composite unique indexes back the scan, so a concurrent
/// duplicate surfaces as the same conflict instead of a raw driver error.
#[derive(Clone)]
pub struct HierarchyService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<EventSender>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateEnterprise {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateEnterprise {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub disabled: Option<bool>,
}

/// Create payload shared by every child level; `parent_id` is the immediate
/// parent (enterprise for sites, site for areas, and so on).
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateNode {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub parent_id: i32,
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateNode {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub parent_id: Option<i32>,
    pub disabled: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLine {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub parent_id: i32,
    #[serde(default)]
    pub disabled: bool,
    /// Ideal seconds per unit, used by the OEE performance calculation.
    #[validate(range(min = 0.0))]
    pub ideal_cycle_time: Option<f64>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateLine {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub parent_id: Option<i32>,
    pub disabled: Option<bool>,
    #[validate(range(min = 0.0))]
    pub ideal_cycle_time: Option<f64>,
}

impl HierarchyService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    // Enterprise

    #[instrument(skip(self))]
    pub async fn create_enterprise(
        &self,
        input: CreateEnterprise,
    ) -> Result<enterprise::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        let existing = enterprise::Entity::find()
            .filter(enterprise::Column::Name.eq(input.name.clone()))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Enterprise '{}' already exists",
                input.name
            )));
        }

        let created = enterprise::ActiveModel {
            name: Set(input.name.clone()),
            disabled: Set(input.disabled),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| {
            ServiceError::write_error(e, format!("Enterprise '{}' already exists", input.name))
        })?;

        self.emit(Event::EnterpriseCreated(created.id)).await;
        info!(id = created.id, name = %created.name, "enterprise created");
        Ok(created)
    }

    pub async fn list_enterprises(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<enterprise::Model>, u64), ServiceError> {
        let db = &*self.db;
        let total = enterprise::Entity::find().count(db).await?;
        let items = enterprise::Entity::find()
            .order_by_asc(enterprise::Column::Id)
            .offset(page.saturating_sub(1) * per_page)
            .limit(per_page)
            .all(db)
            .await?;
        Ok((items, total))
    }

    pub async fn get_enterprise(&self, id: i32) -> Result<enterprise::Model, ServiceError> {
        enterprise::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Enterprise {id} not found")))
    }

    #[instrument(skip(self))]
    pub async fn update_enterprise(
        &self,
        id: i32,
        input: UpdateEnterprise,
    ) -> Result<enterprise::Model, ServiceError> {
        input.validate()?;
        let model = self.get_enterprise(id).await?;

        let mut active = model.clone().into_active_model();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(disabled) = input.disabled {
            active.disabled = Set(disabled);
        }
        if !active.is_changed() {
            return Ok(model);
        }
        let updated = active
            .update(&*self.db)
            .await
            .map_err(|e| ServiceError::write_error(e, "Enterprise name already in use"))?;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_enterprise(&self, id: i32) -> Result<(), ServiceError> {
        let model = self.get_enterprise(id).await?;
        model.delete(&*self.db).await.map_err(|e| {
            ServiceError::delete_error(e, format!("Enterprise {id} still has sites"))
        })?;
        info!(id, "enterprise deleted");
        Ok(())
    }

    // Site

    #[instrument(skip(self))]
    pub async fn create_site(&self, input: CreateNode) -> Result<site::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        let parent = enterprise::Entity::find_by_id(input.parent_id).one(db).await?;
        if parent.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Parent enterprise {} not found",
                input.parent_id
            )));
        }

        let duplicate = site::Entity::find()
            .filter(site::Column::Name.eq(input.name.clone()))
            .filter(site::Column::EnterpriseId.eq(input.parent_id))
            .one(db)
            .await?;
        if duplicate.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Site '{}' already exists in enterprise {}",
                input.name, input.parent_id
            )));
        }

        let created = site::ActiveModel {
            name: Set(input.name.clone()),
            disabled: Set(input.disabled),
            enterprise_id: Set(input.parent_id),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| {
            ServiceError::write_error(
                e,
                format!("Site '{}' already exists in enterprise {}", input.name, input.parent_id),
            )
        })?;

        self.emit(Event::SiteCreated(created.id)).await;
        info!(id = created.id, name = %created.name, "site created");
        Ok(created)
    }

    pub async fn list_sites(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<site::Model>, u64), ServiceError> {
        let db = &*self.db;
        let total = site::Entity::find().count(db).await?;
        let items = site::Entity::find()
            .order_by_asc(site::Column::Id)
            .offset(page.saturating_sub(1) * per_page)
            .limit(per_page)
            .all(db)
            .await?;
        Ok((items, total))
    }

    pub async fn get_site(&self, id: i32) -> Result<site::Model, ServiceError> {
        site::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Site {id} not found")))
    }

    #[instrument(skip(self))]
    pub async fn update_site(&self, id: i32, input: UpdateNode) -> Result<site::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;
        let model = self.get_site(id).await?;

        if let Some(parent_id) = input.parent_id {
            let parent = enterprise::Entity::find_by_id(parent_id).one(db).await?;
            if parent.is_none() {
                return Err(ServiceError::NotFound(format!(
                    "Parent enterprise {parent_id} not found"
                )));
            }
        }

        let mut active = model.clone().into_active_model();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(parent_id) = input.parent_id {
            active.enterprise_id = Set(parent_id);
        }
        if let Some(disabled) = input.disabled {
            active.disabled = Set(disabled);
        }
        if !active.is_changed() {
            return Ok(model);
        }
        let updated = active
            .update(db)
            .await
            .map_err(|e| ServiceError::write_error(e, "Site name already in use in enterprise"))?;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_site(&self, id: i32) -> Result<(), ServiceError> {
        let model = self.get_site(id).await?;
        model
            .delete(&*self.db)
            .await
            .map_err(|e| ServiceError::delete_error(e, format!("Site {id} still has areas")))?;
        info!(id, "site deleted");
        Ok(())
    }

    // Area

    #[instrument(skip(self))]
    pub async fn create_area(&self, input: CreateNode) -> Result<area::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        let parent = site::Entity::find_by_id(input.parent_id).one(db).await?;
        if parent.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Parent site {} not found",
                input.parent_id
            )));
        }

        let duplicate = area::Entity::find()
            .filter(area::Column::Name.eq(input.name.clone()))
            .filter(area::Column::SiteId.eq(input.parent_id))
            .one(db)
            .await?;
        if duplicate.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Area '{}' already exists in site {}",
                input.name, input.parent_id
            )));
        }

        let created = area::ActiveModel {
            name: Set(input.name.clone()),
            disabled: Set(input.disabled),
            site_id: Set(input.parent_id),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| {
            ServiceError::write_error(
                e,
                format!("Area '{}' already exists in site {}", input.name, input.parent_id),
            )
        })?;

        self.emit(Event::AreaCreated(created.id)).await;
        info!(id = created.id, name = %created.name, "area created");
        Ok(created)
    }

    pub async fn list_areas(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<area::Model>, u64), ServiceError> {
        let db = &*self.db;
        let total = area::Entity::find().count(db).await?;
        let items = area::Entity::find()
            .order_by_asc(area::Column::Id)
            .offset(page.saturating_sub(1) * per_page)
            .limit(per_page)
            .all(db)
            .await?;
        Ok((items, total))
    }

    pub async fn get_area(&self, id: i32) -> Result<area::Model, ServiceError> {
        area::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Area {id} not found")))
    }

    #[instrument(skip(self))]
    pub async fn update_area(&self, id: i32, input: UpdateNode) -> Result<area::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;
        let model = self.get_area(id).await?;

        if let Some(parent_id) = input.parent_id {
            let parent = site::Entity::find_by_id(parent_id).one(db).await?;
            if parent.is_none() {
                return Err(ServiceError::NotFound(format!(
                    "Parent site {parent_id} not found"
                )));
            }
        }

        let mut active = model.clone().into_active_model();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(parent_id) = input.parent_id {
            active.site_id = Set(parent_id);
        }
        if let Some(disabled) = input.disabled {
            active.disabled = Set(disabled);
        }
        if !active.is_changed() {
            return Ok(model);
        }
        let updated = active
            .update(db)
            .await
            .map_err(|e| ServiceError::write_error(e, "Area name already in use in site"))?;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_area(&self, id: i32) -> Result<(), ServiceError> {
        let model = self.get_area(id).await?;
        model
            .delete(&*self.db)
            .await
            .map_err(|e| ServiceError::delete_error(e, format!("Area {id} still has lines")))?;
        info!(id, "area deleted");
        Ok(())
    }

    // Line

    #[instrument(skip(self))]
    pub async fn create_line(&self, input: CreateLine) -> Result<line::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        let parent = area::Entity::find_by_id(input.parent_id).one(db).await?;
        if parent.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Parent area {} not found",
                input.parent_id
            )));
        }

        let duplicate = line::Entity::find()
            .filter(line::Column::Name.eq(input.name.clone()))
            .filter(line::Column::AreaId.eq(input.parent_id))
            .one(db)
            .await?;
        if duplicate.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Line '{}' already exists in area {}",
                input.name, input.parent_id
            )));
        }

        let created = line::ActiveModel {
            name: Set(input.name.clone()),
            disabled: Set(input.disabled),
            area_id: Set(input.parent_id),
            ideal_cycle_time: Set(input.ideal_cycle_time),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| {
            ServiceError::write_error(
                e,
                format!("Line '{}' already exists in area {}", input.name, input.parent_id),
            )
        })?;

        self.emit(Event::LineCreated(created.id)).await;
        info!(id = created.id, name = %created.name, "line created");
        Ok(created)
    }

    pub async fn list_lines(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<line::Model>, u64), ServiceError> {
        let db = &*self.db;
        let total = line::Entity::find().count(db).await?;
        let items = line::Entity::find()
            .order_by_asc(line::Column::Id)
            .offset(page.saturating_sub(1) * per_page)
            .limit(per_page)
            .all(db)
            .await?;
        Ok((items, total))
    }

    pub async fn get_line(&self, id: i32) -> Result<line::Model, ServiceError> {
        line::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Line {id} not found")))
    }

    #[instrument(skip(self))]
    pub async fn update_line(&self, id: i32, input: UpdateLine) -> Result<line::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;
        let model = self.get_line(id).await?;

        if let Some(parent_id) = input.parent_id {
            let parent = area::Entity::find_by_id(parent_id).one(db).await?;
            if parent.is_none() {
                return Err(ServiceError::NotFound(format!(
                    "Parent area {parent_id} not found"
                )));
            }
        }

        let mut active = model.clone().into_active_model();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(parent_id) = input.parent_id {
            active.area_id = Set(parent_id);
        }
        if let Some(disabled) = input.disabled {
            active.disabled = Set(disabled);
        }
        if let Some(ideal_cycle_time) = input.ideal_cycle_time {
            active.ideal_cycle_time = Set(Some(ideal_cycle_time));
        }
        if !active.is_changed() {
            return Ok(model);
        }
        let updated = active
            .update(db)
            .await
            .map_err(|e| ServiceError::write_error(e, "Line name already in use in area"))?;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_line(&self, id: i32) -> Result<(), ServiceError> {
        let model = self.get_line(id).await?;
        model.delete(&*self.db).await.map_err(|e| {
            ServiceError::delete_error(e, format!("Line {id} is still referenced"))
        })?;
        info!(id, "line deleted");
        Ok(())
    }

    // Cell

    #[instrument(skip(self))]
    pub async fn create_cell(&self, input: CreateNode) -> Result<cell::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        let parent = line::Entity::find_by_id(input.parent_id).one(db).await?;
        if parent.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Parent line {} not found",
                input.parent_id
            )));
        }

        let duplicate = cell::Entity::find()
            .filter(cell::Column::Name.eq(input.name.clone()))
            .filter(cell::Column::LineId.eq(input.parent_id))
            .one(db)
            .await?;
        if duplicate.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Cell '{}' already exists in line {}",
                input.name, input.parent_id
            )));
        }

        let created = cell::ActiveModel {
            name: Set(input.name.clone()),
            disabled: Set(input.disabled),
            line_id: Set(input.parent_id),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| {
            ServiceError::write_error(
                e,
                format!("Cell '{}' already exists in line {}", input.name, input.parent_id),
            )
        })?;

        self.emit(Event::CellCreated(created.id)).await;
        info!(id = created.id, name = %created.name, "cell created");
        Ok(created)
    }

    pub async fn list_cells(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<cell::Model>, u64), ServiceError> {
        let db = &*self.db;
        let total = cell::Entity::find().count(db).await?;
        let items = cell::Entity::find()
            .order_by_asc(cell::Column::Id)
            .offset(page.saturating_sub(1) * per_page)
            .limit(per_page)
            .all(db)
            .await?;
        Ok((items, total))
    }

    pub async fn get_cell(&self, id: i32) -> Result<cell::Model, ServiceError> {
        cell::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cell {id} not found")))
    }

    #[instrument(skip(self))]
    pub async fn update_cell(&self, id: i32, input: UpdateNode) -> Result<cell::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;
        let model = self.get_cell(id).await?;

        if let Some(parent_id) = input.parent_id {
            let parent = line::Entity::find_by_id(parent_id).one(db).await?;
            if parent.is_none() {
                return Err(ServiceError::NotFound(format!(
                    "Parent line {parent_id} not found"
                )));
            }
        }

        let mut active = model.clone().into_active_model();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(parent_id) = input.parent_id {
            active.line_id = Set(parent_id);
        }
        if let Some(disabled) = input.disabled {
            active.disabled = Set(disabled);
        }
        if !active.is_changed() {
            return Ok(model);
        }
        let updated = active
            .update(db)
            .await
            .map_err(|e| ServiceError::write_error(e, "Cell name already in use in line"))?;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_cell(&self, id: i32) -> Result<(), ServiceError> {
        let model = self.get_cell(id).await?;
        model
            .delete(&*self.db)
            .await
            .map_err(|e| ServiceError::delete_error(e, format!("Cell {id} is still referenced")))?;
        info!(id, "cell deleted");
        Ok(())
    }

    async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            sender.send_or_log(event).await;
        }
    }
}

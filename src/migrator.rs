use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_hierarchy_tables::Migration),
            Box::new(m20250101_000002_create_product_tables::Migration),
            Box::new(m20250101_000003_create_schedule_tables::Migration),
            Box::new(m20250101_000004_create_count_tables::Migration),
            Box::new(m20250101_000005_create_downtime_tables::Migration),
        ]
    }
}

// Migration implementations

mod m20250101_000001_create_hierarchy_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000001_create_hierarchy_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Enterprise::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Enterprise::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Enterprise::Name).string_len(255).not_null())
                        .col(
                            ColumnDef::new(Enterprise::Disabled)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Enterprise::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // Enterprise names are globally unique.
            manager
                .create_index(
                    Index::create()
                        .name("idx_enterprise_name")
                        .table(Enterprise::Table)
                        .col(Enterprise::Name)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Site::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Site::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Site::Name).string_len(255).not_null())
                        .col(
                            ColumnDef::new(Site::Disabled)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Site::EnterpriseId).integer().not_null())
                        .col(
                            ColumnDef::new(Site::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_site_enterprise")
                                .from(Site::Table, Site::EnterpriseId)
                                .to(Enterprise::Table, Enterprise::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            // Sibling names are unique within a parent; these composite
            // indexes back the pre-insert scans against concurrent creators.
            manager
                .create_index(
                    Index::create()
                        .name("idx_site_name_enterprise")
                        .table(Site::Table)
                        .col(Site::Name)
                        .col(Site::EnterpriseId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Area::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Area::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Area::Name).string_len(255).not_null())
                        .col(
                            ColumnDef::new(Area::Disabled)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Area::SiteId).integer().not_null())
                        .col(
                            ColumnDef::new(Area::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_area_site")
                                .from(Area::Table, Area::SiteId)
                                .to(Site::Table, Site::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_area_name_site")
                        .table(Area::Table)
                        .col(Area::Name)
                        .col(Area::SiteId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Line::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Line::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Line::Name).string_len(255).not_null())
                        .col(
                            ColumnDef::new(Line::Disabled)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Line::AreaId).integer().not_null())
                        .col(ColumnDef::new(Line::IdealCycleTime).double())
                        .col(
                            ColumnDef::new(Line::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_line_area")
                                .from(Line::Table, Line::AreaId)
                                .to(Area::Table, Area::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_line_name_area")
                        .table(Line::Table)
                        .col(Line::Name)
                        .col(Line::AreaId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Cell::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Cell::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Cell::Name).string_len(255).not_null())
                        .col(
                            ColumnDef::new(Cell::Disabled)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Cell::LineId).integer().not_null())
                        .col(
                            ColumnDef::new(Cell::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_cell_line")
                                .from(Cell::Table, Cell::LineId)
                                .to(Line::Table, Line::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_cell_name_line")
                        .table(Cell::Table)
                        .col(Cell::Name)
                        .col(Cell::LineId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Cell::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Line::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Area::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Site::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Enterprise::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    pub enum Enterprise {
        Table,
        Id,
        Name,
        Disabled,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub enum Site {
        Table,
        Id,
        Name,
        Disabled,
        EnterpriseId,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub enum Area {
        Table,
        Id,
        Name,
        Disabled,
        SiteId,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub enum Line {
        Table,
        Id,
        Name,
        Disabled,
        AreaId,
        IdealCycleTime,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub enum Cell {
        Table,
        Id,
        Name,
        Disabled,
        LineId,
        CreatedAt,
    }
}

mod m20250101_000002_create_product_tables {
    use super::m20250101_000001_create_hierarchy_tables::Line;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000002_create_product_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ProductCode::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductCode::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(ProductCode::Code).string_len(50).not_null())
                        .col(ColumnDef::new(ProductCode::Description).string_len(255))
                        .col(
                            ColumnDef::new(ProductCode::Disabled)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_product_code_code")
                        .table(ProductCode::Table)
                        .col(ProductCode::Code)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductCodeLine::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductCodeLine::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ProductCodeLine::ProductCodeId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductCodeLine::LineId).integer().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_product_code_line_product")
                                .from(ProductCodeLine::Table, ProductCodeLine::ProductCodeId)
                                .to(ProductCode::Table, ProductCode::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_product_code_line_line")
                                .from(ProductCodeLine::Table, ProductCodeLine::LineId)
                                .to(Line::Table, Line::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_product_code_line_pair")
                        .table(ProductCodeLine::Table)
                        .col(ProductCodeLine::ProductCodeId)
                        .col(ProductCodeLine::LineId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(WorkOrder::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WorkOrder::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(WorkOrder::OrderNumber)
                                .string_len(50)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrder::Description)
                                .string_len(500)
                                .not_null(),
                        )
                        .col(ColumnDef::new(WorkOrder::LineId).integer().not_null())
                        .col(
                            ColumnDef::new(WorkOrder::PlannedStart)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrder::PlannedEnd)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrder::TargetQuantity)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(WorkOrder::Status).string_len(20).not_null())
                        .col(ColumnDef::new(WorkOrder::ActualStart).timestamp_with_time_zone())
                        .col(ColumnDef::new(WorkOrder::ActualEnd).timestamp_with_time_zone())
                        .col(ColumnDef::new(WorkOrder::ActualQuantity).integer())
                        .col(ColumnDef::new(WorkOrder::ProductCodeId).integer())
                        .col(
                            ColumnDef::new(WorkOrder::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrder::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_work_order_line")
                                .from(WorkOrder::Table, WorkOrder::LineId)
                                .to(Line::Table, Line::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_work_order_product_code")
                                .from(WorkOrder::Table, WorkOrder::ProductCodeId)
                                .to(ProductCode::Table, ProductCode::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_work_order_number")
                        .table(WorkOrder::Table)
                        .col(WorkOrder::OrderNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(WorkOrder::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ProductCodeLine::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ProductCode::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    pub enum ProductCode {
        Table,
        Id,
        Code,
        Description,
        Disabled,
    }

    #[derive(DeriveIden)]
    pub enum ProductCodeLine {
        Table,
        Id,
        ProductCodeId,
        LineId,
    }

    #[derive(DeriveIden)]
    pub enum WorkOrder {
        Table,
        Id,
        OrderNumber,
        Description,
        LineId,
        PlannedStart,
        PlannedEnd,
        TargetQuantity,
        Status,
        ActualStart,
        ActualEnd,
        ActualQuantity,
        ProductCodeId,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250101_000003_create_schedule_tables {
    use super::m20250101_000001_create_hierarchy_tables::Line;
    use super::m20250101_000002_create_product_tables::WorkOrder;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000003_create_schedule_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Schedule::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Schedule::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Schedule::LineId).integer().not_null())
                        .col(ColumnDef::new(Schedule::WorkOrderId).integer())
                        .col(
                            ColumnDef::new(Schedule::ScheduleType)
                                .string_len(50)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Schedule::ScheduleStartDatetime)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Schedule::ScheduleFinishDatetime)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Schedule::Note).string_len(255))
                        .col(
                            ColumnDef::new(Schedule::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_schedule_line")
                                .from(Schedule::Table, Schedule::LineId)
                                .to(Line::Table, Line::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_schedule_work_order")
                                .from(Schedule::Table, Schedule::WorkOrderId)
                                .to(WorkOrder::Table, WorkOrder::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Run::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Run::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Run::ScheduleId).integer().not_null())
                        .col(
                            ColumnDef::new(Run::RunStartDatetime)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Run::RunStopDatetime).timestamp_with_time_zone())
                        .col(
                            ColumnDef::new(Run::Closed)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Run::EstimatedFinishTime).timestamp_with_time_zone())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_run_schedule")
                                .from(Run::Table, Run::ScheduleId)
                                .to(Schedule::Table, Schedule::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(RunMetrics::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RunMetrics::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(RunMetrics::RunId).integer().not_null())
                        .col(
                            ColumnDef::new(RunMetrics::GoodCount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(RunMetrics::WasteCount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(RunMetrics::TotalCount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(RunMetrics::Availability)
                                .double()
                                .not_null()
                                .default(0.0),
                        )
                        .col(
                            ColumnDef::new(RunMetrics::Performance)
                                .double()
                                .not_null()
                                .default(0.0),
                        )
                        .col(
                            ColumnDef::new(RunMetrics::Quality)
                                .double()
                                .not_null()
                                .default(0.0),
                        )
                        .col(
                            ColumnDef::new(RunMetrics::Oee)
                                .double()
                                .not_null()
                                .default(0.0),
                        )
                        .col(
                            ColumnDef::new(RunMetrics::UnplannedDowntime)
                                .double()
                                .not_null()
                                .default(0.0),
                        )
                        .col(
                            ColumnDef::new(RunMetrics::PlannedDowntime)
                                .double()
                                .not_null()
                                .default(0.0),
                        )
                        .col(
                            ColumnDef::new(RunMetrics::TotalTime)
                                .double()
                                .not_null()
                                .default(0.0),
                        )
                        .col(
                            ColumnDef::new(RunMetrics::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_run_metrics_run")
                                .from(RunMetrics::Table, RunMetrics::RunId)
                                .to(Run::Table, Run::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            // One metrics record per run.
            manager
                .create_index(
                    Index::create()
                        .name("idx_run_metrics_run")
                        .table(RunMetrics::Table)
                        .col(RunMetrics::RunId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(RunMetrics::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Run::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Schedule::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    pub enum Schedule {
        Table,
        Id,
        LineId,
        WorkOrderId,
        ScheduleType,
        ScheduleStartDatetime,
        ScheduleFinishDatetime,
        Note,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub enum Run {
        Table,
        Id,
        ScheduleId,
        RunStartDatetime,
        RunStopDatetime,
        Closed,
        EstimatedFinishTime,
    }

    #[derive(DeriveIden)]
    pub enum RunMetrics {
        Table,
        Id,
        RunId,
        GoodCount,
        WasteCount,
        TotalCount,
        Availability,
        Performance,
        Quality,
        Oee,
        UnplannedDowntime,
        PlannedDowntime,
        TotalTime,
        UpdatedAt,
    }
}

mod m20250101_000004_create_count_tables {
    use super::m20250101_000003_create_schedule_tables::Run;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000004_create_count_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(CountType::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CountType::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(CountType::Label).string_len(100).not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_count_type_label")
                        .table(CountType::Table)
                        .col(CountType::Label)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CountTag::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CountTag::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(CountTag::Path).string_len(255).not_null())
                        .col(ColumnDef::new(CountTag::ParentId).integer().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_count_tag_count_type")
                                .from(CountTag::Table, CountTag::ParentId)
                                .to(CountType::Table, CountType::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_count_tag_path")
                        .table(CountTag::Table)
                        .col(CountTag::Path)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CountHistory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CountHistory::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(CountHistory::Timestamp)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CountHistory::Count).integer().not_null())
                        .col(ColumnDef::new(CountHistory::TagId).integer().not_null())
                        .col(
                            ColumnDef::new(CountHistory::CountTypeId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CountHistory::RunId).integer())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_count_history_tag")
                                .from(CountHistory::Table, CountHistory::TagId)
                                .to(CountTag::Table, CountTag::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_count_history_count_type")
                                .from(CountHistory::Table, CountHistory::CountTypeId)
                                .to(CountType::Table, CountType::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_count_history_run")
                                .from(CountHistory::Table, CountHistory::RunId)
                                .to(Run::Table, Run::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_count_history_run")
                        .table(CountHistory::Table)
                        .col(CountHistory::RunId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CountHistory::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(CountTag::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(CountType::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    pub enum CountType {
        Table,
        Id,
        Label,
    }

    #[derive(DeriveIden)]
    pub enum CountTag {
        Table,
        Id,
        Path,
        ParentId,
    }

    #[derive(DeriveIden)]
    pub enum CountHistory {
        Table,
        Id,
        Timestamp,
        Count,
        TagId,
        CountTypeId,
        RunId,
    }
}

mod m20250101_000005_create_downtime_tables {
    use super::m20250101_000001_create_hierarchy_tables::Line;
    use super::m20250101_000003_create_schedule_tables::Run;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000005_create_downtime_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StateReason::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StateReason::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(StateReason::Name).string_len(255).not_null())
                        .col(ColumnDef::new(StateReason::Code).string_len(50).not_null())
                        .col(
                            ColumnDef::new(StateReason::RecordDowntime)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(StateReason::PlannedDowntime)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(StateReason::OperatorSelectable)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(StateReason::ParentId).integer())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_state_reason_parent")
                                .from(StateReason::Table, StateReason::ParentId)
                                .to(StateReason::Table, StateReason::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_state_reason_code")
                        .table(StateReason::Table)
                        .col(StateReason::Code)
                        .unique()
                        .to_owned(),
                )
                .await?;

            // Sub-reason listings are a reverse lookup on the parent pointer.
            manager
                .create_index(
                    Index::create()
                        .name("idx_state_reason_parent")
                        .table(StateReason::Table)
                        .col(StateReason::ParentId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StateHistory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StateHistory::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(StateHistory::StartDatetime)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StateHistory::EndDatetime).timestamp_with_time_zone())
                        .col(
                            ColumnDef::new(StateHistory::StateReasonId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StateHistory::ReasonName)
                                .string_len(255)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StateHistory::ReasonCode)
                                .string_len(50)
                                .not_null(),
                        )
                        .col(ColumnDef::new(StateHistory::LineId).integer())
                        .col(ColumnDef::new(StateHistory::RunId).integer())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_state_history_reason")
                                .from(StateHistory::Table, StateHistory::StateReasonId)
                                .to(StateReason::Table, StateReason::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_state_history_line")
                                .from(StateHistory::Table, StateHistory::LineId)
                                .to(Line::Table, Line::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_state_history_run")
                                .from(StateHistory::Table, StateHistory::RunId)
                                .to(Run::Table, Run::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_state_history_run")
                        .table(StateHistory::Table)
                        .col(StateHistory::RunId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StateHistory::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StateReason::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    pub enum StateReason {
        Table,
        Id,
        Name,
        Code,
        RecordDowntime,
        PlannedDowntime,
        OperatorSelectable,
        ParentId,
    }

    #[derive(DeriveIden)]
    pub enum StateHistory {
        Table,
        Id,
        StartDatetime,
        EndDatetime,
        StateReasonId,
        ReasonName,
        ReasonCode,
        LineId,
        RunId,
    }
}

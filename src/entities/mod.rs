//! Sea-orm entities for the MES relational schema.

pub mod area;
pub mod cell;
pub mod count_history;
pub mod count_tag;
pub mod count_type;
pub mod enterprise;
pub mod line;
pub mod product_code;
pub mod product_code_line;
pub mod run;
pub mod run_metrics;
pub mod schedule;
pub mod site;
pub mod state_history;
pub mod state_reason;
pub mod work_order;

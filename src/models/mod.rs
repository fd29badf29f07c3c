pub mod analytics;
pub mod click;
pub mod record;

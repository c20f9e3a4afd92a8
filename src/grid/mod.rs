/// Date to (ISO year, ISO week, weekday offset) mapping.
pub mod mapper;

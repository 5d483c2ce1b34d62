pub mod api_json;
pub mod json_extract;
pub mod time;

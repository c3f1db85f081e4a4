mod json_ld;

pub use self::json_ld::{extract_recipe, find_ld_json, is_recipe};

pub mod find_page;
pub mod get_page;
pub mod images;
pub mod mcp_router;
pub mod on_this_day;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

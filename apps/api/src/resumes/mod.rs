// Resume document and profile persistence plus their HTTP handlers.
// Documents are replaced wholesale on write (last-write-wins); every edit
// batch goes through the section engine before anything is persisted.

pub mod handlers;
pub mod store;

pub mod item_store;
pub mod json_item_store;
pub mod json_reference_table;
pub mod reference_lookup;
pub mod transcript_verifier;

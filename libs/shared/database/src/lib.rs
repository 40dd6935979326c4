pub mod supabase;

pub use supabase::{is_conflict, SupabaseClient, SupabaseError};

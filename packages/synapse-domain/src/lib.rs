pub mod intent;
pub mod media;
pub mod taxonomy;
pub mod text;

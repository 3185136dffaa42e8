pub mod error;
pub mod formats;
pub mod fs;

pub use error::{DownsizerError, DownsizerResult};
pub use formats::{ImageKind, kind_from_extension, is_supported};
pub use fs::{
    get_file_size,
    list_images,
    derive_output_path,
    sibling_with_extension,
    ensure_dir,
    OutputDir,
};

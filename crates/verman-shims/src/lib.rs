mod fs_utils;
mod layout;
mod store;

pub use fs_utils::{
    copy_tree, create_symlink, current_unix_timestamp, is_executable_file, move_path,
    remove_file_if_exists, unique_suffix,
};
pub use layout::{default_user_root, ManagedLayout};
pub use store::{validate_command_name, InstallStrategy, ShimStore};

mod state;
mod store;

pub use state::CommandRecord;
pub use store::RecordStore;

#[cfg(test)]
mod tests;

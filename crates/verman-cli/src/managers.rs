use anyhow::Result;
use verman_core::{CommandManager, RegistryError};
use verman_doctor::Doctor;
use verman_records::RecordStore;
use verman_shims::ShimStore;

use crate::config::Config;

type ManagerFactory = fn(&Config) -> Result<Box<dyn CommandManager>>;

const PROVIDERS: [(&str, ManagerFactory); 3] = [
    ("shims", open_shims_manager),
    ("records", open_records_manager),
    ("doctor", open_doctor_manager),
];

pub(crate) fn provider_tags() -> Vec<&'static str> {
    PROVIDERS.iter().map(|(tag, _)| *tag).collect()
}

pub(crate) fn open_manager(tag: &str, config: &Config) -> Result<Box<dyn CommandManager>> {
    let Some((_, factory)) = PROVIDERS.iter().find(|(known, _)| *known == tag) else {
        return Err(RegistryError::UnknownProvider {
            tag: tag.to_string(),
        }
        .into());
    };
    factory(config)
}

pub(crate) fn open_shims(config: &Config) -> Result<ShimStore> {
    let store = ShimStore::new(config.layout(), config.install_strategy);
    store.init()?;
    Ok(store)
}

pub(crate) fn open_records(config: &Config) -> Result<RecordStore> {
    RecordStore::open(open_shims(config)?)
}

pub(crate) fn open_doctor(config: &Config) -> Result<Doctor> {
    let shims = open_shims(config)?;
    let records = RecordStore::open(shims.clone())?;
    Ok(Doctor::new(Box::new(shims), Box::new(records)).with_backup_root(config.root.clone()))
}

fn open_shims_manager(config: &Config) -> Result<Box<dyn CommandManager>> {
    Ok(Box::new(open_shims(config)?))
}

fn open_records_manager(config: &Config) -> Result<Box<dyn CommandManager>> {
    Ok(Box::new(open_records(config)?))
}

fn open_doctor_manager(config: &Config) -> Result<Box<dyn CommandManager>> {
    Ok(Box::new(open_doctor(config)?))
}

use std::collections::HashMap;

use verman_core::{version, Command};

pub fn merge_key(command: &Command) -> String {
    format!("{}-{}", command.name, version::identity_key(&command.version))
}

pub fn merge_commands(first: Vec<Command>, second: Vec<Command>) -> Vec<Command> {
    let mut merged: Vec<Command> = Vec::with_capacity(first.len() + second.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for command in first.into_iter().chain(second) {
        let key = merge_key(&command);
        match index.get(&key) {
            Some(&position) => merged[position].activated = command.activated,
            None => {
                index.insert(key, merged.len());
                merged.push(command);
            }
        }
    }

    merged
}

#![allow(missing_docs)]

use std::{collections::HashMap, sync::Arc};

use datahasher::StructuralHash;

#[derive(Debug, Clone, PartialEq, Eq, StructuralHash)]
pub struct Person {
    pub name: String,
    pub age: u32,
}

#[derive(Debug, Clone, StructuralHash)]
pub struct Team {
    pub name: String,
    pub members: Vec<Arc<Person>>,
    pub roles: HashMap<String, Vec<Arc<Person>>>,
}

#[must_use]
pub fn create_person(seed: u32) -> Person {
    Person { name: format!("person-{seed}"), age: seed % 97 }
}

/// Builds a team with `size` members, each also listed under one of eight
/// roles.
#[must_use]
pub fn create_team(size: u32) -> Team {
    let members: Vec<_> =
        (0..size).map(|i| Arc::new(create_person(i))).collect();

    let mut roles: HashMap<String, Vec<Arc<Person>>> = HashMap::new();
    for member in &members {
        roles
            .entry(format!("role-{}", member.age % 8))
            .or_default()
            .push(Arc::clone(member));
    }

    Team { name: format!("team-{size}"), members, roles }
}

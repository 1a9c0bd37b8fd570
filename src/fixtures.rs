use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;

use crate::config::ModuleDictionary;
use crate::models::{Entrega, Principal, Resource, TurnoRecord, Usuario};

/// Everything a dashboard would have fetched for one session.
#[derive(Debug, Clone, Default)]
pub struct Fixtures {
    pub usuarios: Vec<Usuario>,
    pub turnos: Vec<TurnoRecord>,
    pub entregas: Vec<Entrega>,
}

impl Fixtures {
    pub fn load(
        usuarios: Option<&Path>,
        turnos: Option<&Path>,
        entregas: Option<&Path>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            usuarios: load_optional_list(usuarios)?,
            turnos: load_optional_list(turnos)?,
            entregas: load_optional_list(entregas)?,
        })
    }

    pub fn normalize_modules(&mut self, dictionary: &ModuleDictionary) {
        for usuario in &mut self.usuarios {
            dictionary.normalize_in_place(&mut usuario.modulo);
        }
        for turno in &mut self.turnos {
            dictionary.normalize_in_place(&mut turno.modulo);
        }
        for entrega in &mut self.entregas {
            dictionary.normalize_in_place(&mut entrega.modulo);
        }
    }
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

/// Reads a list of records from a `.csv` file or a JSON array.
pub fn load_list<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    if !is_csv {
        return load_json(path);
    }

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut records = Vec::new();

    for (index, result) in reader.deserialize::<T>().enumerate() {
        let record =
            result.with_context(|| format!("{} row {}", path.display(), index + 1))?;
        records.push(record);
    }

    Ok(records)
}

fn load_optional_list<T: DeserializeOwned>(path: Option<&Path>) -> anyhow::Result<Vec<T>> {
    match path {
        Some(path) => load_list(path),
        None => Ok(Vec::new()),
    }
}

pub fn load_principal(path: &Path, dictionary: &ModuleDictionary) -> anyhow::Result<Principal> {
    let principal: Principal = load_json(path)?;
    let modulo = principal.modulo().map(|label| dictionary.normalize(label));
    Ok(Principal::new(
        principal.id(),
        principal.role(),
        modulo,
        principal.cohort(),
    )?)
}

pub fn load_resource(path: &Path, dictionary: &ModuleDictionary) -> anyhow::Result<Resource> {
    let mut resource: Resource = load_json(path)?;
    match &mut resource {
        Resource::Usuario(usuario) => dictionary.normalize_in_place(&mut usuario.modulo),
        Resource::Turno(turno) => dictionary.normalize_in_place(&mut turno.modulo),
        Resource::Entrega(entrega) => dictionary.normalize_in_place(&mut entrega.modulo),
    }
    Ok(resource)
}

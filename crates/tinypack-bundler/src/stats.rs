//! Result of a compilation pass

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::Serialize;
use serde_json::{json, Value};

use crate::graph::Module;

/// One output unit per entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub name: String,
    /// Id of the entry module
    pub entry_module: String,
    /// Ids of every module in the chunk, entry included
    pub modules: Vec<String>,
    pub filename: String,
}

#[derive(Debug, Clone)]
pub struct Stats {
    pub chunks: Vec<Chunk>,
    pub modules: Vec<Module>,
    /// Output filename to bundle text
    pub assets: BTreeMap<String, String>,
    pub(crate) file_dependencies: BTreeSet<PathBuf>,
}

impl Stats {
    /// `{ chunks, modules, assets }` as JSON.
    pub fn to_json(&self) -> Value {
        json!({
            "chunks": self.chunks,
            "modules": self.modules,
            "assets": self.assets,
        })
    }

    /// Every file the pass read or resolved.
    pub fn file_dependencies(&self) -> &BTreeSet<PathBuf> {
        &self.file_dependencies
    }

    pub fn chunk(&self, name: &str) -> Option<&Chunk> {
        self.chunks.iter().find(|chunk| chunk.name == name)
    }

    pub fn module(&self, id: &str) -> Option<&Module> {
        self.modules.iter().find(|module| module.id == id)
    }

    pub fn asset(&self, filename: &str) -> Option<&str> {
        self.assets.get(filename).map(String::as_str)
    }
}

//! Placeable models and where they come from

use crate::error::ModelError;
use anyhow::Context;
use async_trait::async_trait;
use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Selection key of the built-in cube
pub const CUBE_SELECTION: &str = "cube";

/// A node of a loaded model's hierarchy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelNode {
    /// Node name
    pub name: String,
    /// Transform relative to the parent node
    pub local_transform: Mat4,
    /// Mesh index, if the node has geometry
    pub mesh: Option<usize>,
    /// Children node indices
    pub children: Vec<usize>,
}

/// A model ready to be placed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelAsset {
    /// Display name
    pub name: String,
    /// File the model was read from
    pub source: PathBuf,
    /// All nodes
    pub nodes: Vec<ModelNode>,
    /// Root node indices
    pub roots: Vec<usize>,
    /// Number of meshes in the document
    pub mesh_count: usize,
}

impl ModelAsset {
    /// Look up a node by name
    pub fn node(&self, name: &str) -> Option<&ModelNode> {
        self.nodes.iter().find(|node| node.name == name)
    }
}

/// What a selection key stands for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// The built-in cube
    Cube,
    /// A glTF file
    File(PathBuf),
}

/// Maps model selection keys to sources
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    entries: BTreeMap<String, PathBuf>,
}

impl ModelCatalog {
    /// Build from configured `key -> path` pairs
    pub fn new(entries: BTreeMap<String, PathBuf>) -> Self {
        Self { entries }
    }

    /// Resolve a selection key. A configured entry named `cube` overrides the built-in.
    pub fn resolve(&self, key: &str) -> Result<ModelSource, ModelError> {
        if let Some(path) = self.entries.get(key) {
            return Ok(ModelSource::File(path.clone()));
        }
        if key == CUBE_SELECTION {
            return Ok(ModelSource::Cube);
        }
        Err(ModelError::UnknownSelection(key.to_string()))
    }

    /// All selectable keys, the built-in cube included
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        if !self.entries.contains_key(CUBE_SELECTION) {
            keys.insert(0, CUBE_SELECTION);
        }
        keys
    }
}

/// Loads models for placement
#[async_trait(?Send)]
pub trait ModelProvider {
    /// Load the model stored at `path`
    async fn load(&self, path: &Path) -> Result<ModelAsset, ModelError>;
}

/// Reads `.gltf` and `.glb` files
#[derive(Debug, Clone, Copy, Default)]
pub struct GltfModelProvider;

#[async_trait(?Send)]
impl ModelProvider for GltfModelProvider {
    #[cfg(not(target_arch = "wasm32"))]
    async fn load(&self, path: &Path) -> Result<ModelAsset, ModelError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        parse_gltf(path, &bytes)
    }

    #[cfg(target_arch = "wasm32")]
    async fn load(&self, _path: &Path) -> Result<ModelAsset, ModelError> {
        Err(ModelError::Unsupported)
    }
}

/// Parse a glTF document's scene graph
///
/// Only the hierarchy is read; buffers are never touched, so `.gltf` files with
/// external buffers parse without them.
pub fn parse_gltf(path: &Path, bytes: &[u8]) -> Result<ModelAsset, ModelError> {
    let gltf = gltf::Gltf::from_slice(bytes)
        .context("invalid glTF document")
        .map_err(|source| ModelError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let mut asset = ModelAsset {
        name: path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Imported")
            .to_string(),
        source: path.to_path_buf(),
        nodes: Vec::new(),
        roots: Vec::new(),
        mesh_count: gltf.meshes().count(),
    };

    if let Some(scene) = gltf.default_scene().or_else(|| gltf.scenes().next()) {
        for node in scene.nodes() {
            let index = load_node(&node, &mut asset.nodes);
            asset.roots.push(index);
        }
    }

    Ok(asset)
}

fn load_node(gltf_node: &gltf::Node, nodes: &mut Vec<ModelNode>) -> usize {
    let (translation, rotation, scale) = gltf_node.transform().decomposed();
    let local_transform = Mat4::from_scale_rotation_translation(
        Vec3::from(scale),
        Quat::from_array(rotation),
        Vec3::from(translation),
    );

    let index = nodes.len();
    nodes.push(ModelNode {
        name: gltf_node.name().unwrap_or("Node").to_string(),
        local_transform,
        mesh: gltf_node.mesh().map(|mesh| mesh.index()),
        children: Vec::new(),
    });

    for child in gltf_node.children() {
        let child_index = load_node(&child, nodes);
        nodes[index].children.push(child_index);
    }

    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TWO_NODE_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [ { "nodes": [0] } ],
        "nodes": [
            { "name": "Chair", "translation": [0.0, 0.5, 0.0], "children": [1] },
            { "name": "Cushion", "scale": [2.0, 2.0, 2.0] }
        ]
    }"#;

    #[test]
    fn test_parse_hierarchy() {
        let asset = parse_gltf(Path::new("assets/chair.gltf"), TWO_NODE_GLTF.as_bytes()).unwrap();

        assert_eq!(asset.name, "chair");
        assert_eq!(asset.roots, vec![0]);
        assert_eq!(asset.mesh_count, 0);
        assert_eq!(asset.nodes.len(), 2);
        assert_eq!(asset.nodes[0].children, vec![1]);

        let chair = asset.node("Chair").unwrap();
        assert_eq!(chair.local_transform.w_axis.truncate(), Vec3::new(0.0, 0.5, 0.0));

        let cushion = asset.node("Cushion").unwrap();
        assert_eq!(cushion.local_transform, Mat4::from_scale(Vec3::splat(2.0)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse_gltf(Path::new("broken.glb"), b"not a model").unwrap_err();
        assert!(matches!(err, ModelError::Parse { .. }));
        assert!(err.to_string().starts_with("failed to parse model broken.glb"));
    }

    #[test]
    fn test_catalog_resolution() {
        let mut entries = BTreeMap::new();
        entries.insert("chair".to_string(), PathBuf::from("assets/chair.glb"));
        let catalog = ModelCatalog::new(entries);

        assert_eq!(catalog.resolve("cube").unwrap(), ModelSource::Cube);
        assert_eq!(
            catalog.resolve("chair").unwrap(),
            ModelSource::File(PathBuf::from("assets/chair.glb"))
        );
        assert!(matches!(
            catalog.resolve("lamp"),
            Err(ModelError::UnknownSelection(key)) if key == "lamp"
        ));
        assert_eq!(catalog.keys(), vec!["cube", "chair"]);
    }

    #[tokio::test]
    async fn test_provider_reads_file() {
        let mut file = tempfile::Builder::new().suffix(".gltf").tempfile().unwrap();
        file.write_all(TWO_NODE_GLTF.as_bytes()).unwrap();

        let asset = GltfModelProvider.load(file.path()).await.unwrap();
        assert_eq!(asset.nodes.len(), 2);
        assert_eq!(asset.source, file.path());
    }

    #[tokio::test]
    async fn test_provider_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.glb");

        let err = GltfModelProvider.load(&missing).await.unwrap_err();
        assert!(matches!(err, ModelError::Io { path, .. } if path == missing));
    }
}

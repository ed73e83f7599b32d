//! Inspect placeable models

use anyhow::{bail, Result};
use colored::*;
use hitplace_core::model::ModelAsset;
use hitplace_core::{GltfModelProvider, HitplaceConfig, ModelCatalog, ModelProvider, ModelSource};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Print what `target` (a catalog key or a file path) would place
pub async fn inspect_model(target: &str, config: &HitplaceConfig) -> Result<()> {
    let catalog = ModelCatalog::new(config.models.clone());

    let source = match catalog.resolve(target) {
        Ok(source) => source,
        Err(_) if Path::new(target).exists() => ModelSource::File(PathBuf::from(target)),
        Err(error) => {
            let keys = catalog.keys().join(", ");
            bail!("{} (known keys: {})", error, keys);
        }
    };

    match source {
        ModelSource::Cube => {
            println!("{} Built-in cube", "→".blue().bold());
            println!("  Edge length: {} m", config.placement.primitive_size);
        }
        ModelSource::File(path) => {
            let asset = GltfModelProvider.load(&path).await?;
            println!("{} {}", "→".blue().bold(), path.display());
            print!("{}", describe(&asset));
        }
    }
    Ok(())
}

/// Node tree of `asset`, one indented line per node
pub fn describe(asset: &ModelAsset) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "  {}: {} nodes, {} meshes",
        asset.name,
        asset.nodes.len(),
        asset.mesh_count
    );
    for &root in &asset.roots {
        write_node(asset, root, 2, &mut out);
    }
    out
}

fn write_node(asset: &ModelAsset, index: usize, depth: usize, out: &mut String) {
    let Some(node) = asset.nodes.get(index) else {
        return;
    };
    let (_, _, translation) = node.local_transform.to_scale_rotation_translation();
    let mesh = node
        .mesh
        .map(|mesh| format!(" mesh #{}", mesh))
        .unwrap_or_default();
    let _ = writeln!(
        out,
        "{:indent$}{} [{:.2}, {:.2}, {:.2}]{}",
        "",
        node.name,
        translation.x,
        translation.y,
        translation.z,
        mesh,
        indent = depth * 2
    );
    for &child in &node.children {
        write_node(asset, child, depth + 1, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec3};
    use hitplace_core::model::ModelNode;

    #[test]
    fn test_describe_nests_children() {
        let asset = ModelAsset {
            name: "chair".to_string(),
            source: PathBuf::from("chair.gltf"),
            nodes: vec![
                ModelNode {
                    name: "Chair".to_string(),
                    local_transform: Mat4::from_translation(Vec3::new(0.0, 0.5, 0.0)),
                    mesh: None,
                    children: vec![1],
                },
                ModelNode {
                    name: "Seat".to_string(),
                    local_transform: Mat4::IDENTITY,
                    mesh: Some(0),
                    children: Vec::new(),
                },
            ],
            roots: vec![0],
            mesh_count: 1,
        };

        let text = describe(&asset);
        assert!(text.contains("chair: 2 nodes, 1 meshes"));
        assert!(text.contains("    Chair [0.00, 0.50, 0.00]\n"));
        assert!(text.contains("      Seat [0.00, 0.00, 0.00] mesh #0\n"));
    }

    #[tokio::test]
    async fn test_unknown_key_lists_catalog() {
        let err = inspect_model("no-such-model", &HitplaceConfig::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("known keys: cube"));
    }

    #[tokio::test]
    async fn test_cube_needs_no_file() {
        assert!(inspect_model("cube", &HitplaceConfig::default()).await.is_ok());
    }
}

//! Writes merge results: one image per atlas, the combined mesh, and the
//! material manifest that ties them together.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};
use nebula_config::{ImageFormat, OutputConfig};
use serde::{Deserialize, Serialize};

use crate::error::JobError;
use crate::pipeline::MergeOutputs;

/// The atlas file bound to one texture channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureBinding {
    /// File name relative to the manifest.
    pub file: String,
    /// Larger edge of the atlas, for importers that clamp texture size.
    pub max_texture_size: u32,
}

/// The merged material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialManifest {
    pub name: String,
    pub shader: Option<String>,
    pub textures: BTreeMap<String, TextureBinding>,
}

/// Paths produced by [`write_outputs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFiles {
    pub mesh: PathBuf,
    pub material: PathBuf,
    pub atlases: BTreeMap<String, PathBuf>,
}

fn pretty() -> ron::ser::PrettyConfig {
    ron::ser::PrettyConfig::new()
        .depth_limit(3)
        .enumerate_arrays(false)
}

fn write_file(path: &Path, contents: &str) -> Result<(), JobError> {
    std::fs::write(path, contents).map_err(|source| JobError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn write_image(
    image: &RgbaImage,
    path: &Path,
    format: ImageFormat,
    jpeg_quality: u8,
) -> Result<(), JobError> {
    let encode_err = |source| JobError::Encode {
        path: path.to_path_buf(),
        source,
    };
    match format {
        ImageFormat::Png => image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(encode_err),
        ImageFormat::Jpeg => {
            let file = File::create(path).map_err(|source| JobError::Write {
                path: path.to_path_buf(),
                source,
            })?;
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgba8(image.clone()).into_rgb8();
            let encoder =
                JpegEncoder::new_with_quality(BufWriter::new(file), jpeg_quality.clamp(1, 100));
            rgb.write_with_encoder(encoder).map_err(encode_err)
        }
    }
}

/// Writes everything in `outputs` into `dir`, naming files after `base_name`.
///
/// Atlases are `<base><channel>.<ext>`, the mesh is `<base>.mesh.ron` and the
/// manifest `<base>.material.ron`. The directory is created if needed.
pub fn write_outputs(
    outputs: &MergeOutputs,
    dir: &Path,
    base_name: &str,
    config: &OutputConfig,
) -> Result<WrittenFiles, JobError> {
    std::fs::create_dir_all(dir).map_err(|source| JobError::Write {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut textures = BTreeMap::new();
    let mut atlases = BTreeMap::new();
    for (channel, atlas) in &outputs.atlases {
        let file = format!("{base_name}{channel}.{}", config.format.extension());
        let path = dir.join(&file);
        write_image(&atlas.image, &path, config.format, config.jpeg_quality)?;
        tracing::info!(channel = channel.as_str(), path = %path.display(), "wrote atlas");

        textures.insert(
            channel.clone(),
            TextureBinding {
                file,
                max_texture_size: atlas.max_texture_size(),
            },
        );
        atlases.insert(channel.clone(), path);
    }

    let mesh = dir.join(format!("{base_name}.mesh.ron"));
    write_file(&mesh, &ron::ser::to_string_pretty(&outputs.mesh, pretty())?)?;

    let manifest = MaterialManifest {
        name: base_name.to_string(),
        shader: outputs.shader.clone(),
        textures,
    };
    let material = dir.join(format!("{base_name}.material.ron"));
    write_file(&material, &ron::ser::to_string_pretty(&manifest, pretty())?)?;

    tracing::info!(dir = %dir.display(), atlases = atlases.len(), "wrote merge outputs");
    Ok(WrittenFiles {
        mesh,
        material,
        atlases,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use nebula_atlas::AtlasTexture;
    use nebula_mesh::CombinedMesh;

    fn outputs() -> MergeOutputs {
        let mut atlases = BTreeMap::new();
        let channels = [
            ("_MainTex", [200, 10, 10, 255]),
            ("_BumpMap", [128, 128, 255, 255]),
        ];
        for (channel, color) in channels {
            atlases.insert(
                channel.to_string(),
                AtlasTexture {
                    channel: Some(channel.to_string()),
                    image: RgbaImage::from_pixel(32, 16, Rgba(color)),
                },
            );
        }
        MergeOutputs {
            mesh: CombinedMesh {
                positions: vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                uvs: vec![[0.0; 2], [0.5, 0.0], [0.0, 0.5]],
                indices: vec![0, 1, 2],
                ..Default::default()
            },
            atlases,
            shader: Some("Standard".to_string()),
        }
    }

    #[test]
    fn test_writes_named_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("crate_Merged");
        let written =
            write_outputs(&outputs(), &out, "crate_Merged", &OutputConfig::default()).unwrap();

        assert_eq!(written.mesh, out.join("crate_Merged.mesh.ron"));
        assert_eq!(written.atlases["_MainTex"], out.join("crate_Merged_MainTex.jpg"));
        assert!(written.mesh.exists());
        assert!(written.material.exists());

        let atlas = image::open(&written.atlases["_MainTex"]).unwrap();
        assert_eq!((atlas.width(), atlas.height()), (32, 16));

        let manifest: MaterialManifest =
            ron::from_str(&std::fs::read_to_string(&written.material).unwrap()).unwrap();
        assert_eq!(manifest.shader.as_deref(), Some("Standard"));
        assert_eq!(manifest.textures["_BumpMap"].file, "crate_Merged_BumpMap.jpg");
        assert_eq!(manifest.textures["_BumpMap"].max_texture_size, 32);
    }

    #[test]
    fn test_png_keeps_pixels_exact() {
        let dir = tempfile::tempdir().unwrap();
        let config = OutputConfig {
            format: ImageFormat::Png,
            ..OutputConfig::default()
        };
        let written = write_outputs(&outputs(), dir.path(), "box", &config).unwrap();

        let atlas = image::open(&written.atlases["_MainTex"]).unwrap().to_rgba8();
        assert_eq!(*atlas.get_pixel(3, 3), Rgba([200, 10, 10, 255]));

        let mesh: CombinedMesh =
            ron::from_str(&std::fs::read_to_string(&written.mesh).unwrap()).unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.uvs[1], [0.5, 0.0]);
    }
}

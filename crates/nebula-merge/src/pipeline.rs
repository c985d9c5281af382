//! Runs the mesh combiner and the atlas compositor for one job.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{Rgba, RgbaImage};
use nebula_atlas::{AtlasCompositor, AtlasTexture, CpuBlitter};
use nebula_config::{Config, ResampleFilter};
use nebula_grid::{GridLayout, SubmeshRef};
use nebula_mesh::{CombineOptions, CombinedMesh, SourceMesh, combine};

use crate::error::JobError;
use crate::job::MergeJob;

/// Everything a merge produces, before it is written anywhere.
#[derive(Debug)]
pub struct MergeOutputs {
    pub mesh: CombinedMesh,
    /// One atlas per texture channel.
    pub atlases: BTreeMap<String, AtlasTexture>,
    /// Shader of the merged material.
    pub shader: Option<String>,
}

fn filter_type(filter: ResampleFilter) -> FilterType {
    match filter {
        ResampleFilter::Nearest => FilterType::Nearest,
        ResampleFilter::Triangle => FilterType::Triangle,
        ResampleFilter::CatmullRom => FilterType::CatmullRom,
        ResampleFilter::Gaussian => FilterType::Gaussian,
        ResampleFilter::Lanczos3 => FilterType::Lanczos3,
    }
}

/// Merges already-loaded meshes and channel textures.
///
/// `channels` lists must be aligned to `order`. The mesh is combined first so
/// structural problems are reported before any atlas work starts.
pub fn merge(
    meshes: &[SourceMesh],
    order: &[SubmeshRef],
    channels: &BTreeMap<String, Vec<Option<RgbaImage>>>,
    config: &Config,
) -> Result<MergeOutputs, JobError> {
    let settings = &config.atlas;
    let grid = GridLayout::new(settings.columns, settings.rows)?;
    let options = CombineOptions {
        recalculate_bounds: config.output.recalculate_bounds,
    };

    let mesh = combine(meshes, order, &grid, &options)?;
    tracing::info!(
        vertices = mesh.vertex_count(),
        indices = mesh.indices.len(),
        "combined mesh"
    );

    let backend = CpuBlitter::new(filter_type(settings.filter), settings.max_surface_size);
    let compositor =
        AtlasCompositor::new(backend).with_clear_color(Rgba(settings.background));
    let atlases =
        compositor.composite_channels((settings.width, settings.height), &grid, channels)?;
    tracing::info!(channels = atlases.len(), "composited atlases");

    Ok(MergeOutputs {
        mesh,
        atlases,
        shader: None,
    })
}

fn load_texture(path: &Path) -> Result<RgbaImage, JobError> {
    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|source| JobError::Texture {
            path: path.to_path_buf(),
            source,
        })
}

/// Loads the job's textures relative to `job_dir` and merges everything.
pub fn run(job: &MergeJob, job_dir: &Path, config: &Config) -> Result<MergeOutputs, JobError> {
    let shader = job.shared_shader()?.map(str::to_string);
    let order = job.submesh_order();
    let bindings = job.channel_bindings(&order);

    let mut channels = BTreeMap::new();
    for (channel, paths) in &bindings {
        let textures = paths
            .iter()
            .map(|path| {
                path.as_deref()
                    .map(|p| load_texture(&resolve(job_dir, p)))
                    .transpose()
            })
            .collect::<Result<Vec<_>, _>>()?;
        channels.insert(channel.clone(), textures);
    }

    let mut outputs = merge(&job.source_meshes(), &order, &channels, config)?;
    outputs.shader = shader;
    Ok(outputs)
}

fn resolve(job_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        job_dir.join(path)
    }
}

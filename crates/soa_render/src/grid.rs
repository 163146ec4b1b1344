use bevy::image::ImageSampler;
use bevy::prelude::*;
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use soa_core::AgentKind;
use soa_sim::WatorSim;

/// Largest on-screen size of the grid in pixels
const VIEW_SIZE: Vec2 = Vec2::new(1600.0, 1000.0);

const WATER: [u8; 4] = [8, 16, 40, 255];
const FISH: [u8; 4] = [60, 200, 90, 255];
const SHARK: [u8; 4] = [230, 70, 50, 255];

/// Handle of the texture mirroring the Wa-Tor grid
#[derive(Resource)]
pub struct GridTexture(pub Handle<Image>);

pub fn spawn_grid_sprite(
    mut commands: Commands,
    mut images: ResMut<Assets<Image>>,
    sim: Res<WatorSim>,
) {
    let size = Extent3d {
        width: sim.torus.size_x,
        height: sim.torus.size_y,
        depth_or_array_layers: 1,
    };
    let mut image = Image::new_fill(
        size,
        TextureDimension::D2,
        &WATER,
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::default(),
    );
    image.sampler = ImageSampler::nearest();
    let handle = images.add(image);

    let grid = Vec2::new(sim.torus.size_x as f32, sim.torus.size_y as f32);
    let scale = (VIEW_SIZE / grid).min_element();

    commands.spawn(Sprite {
        image: handle.clone(),
        custom_size: Some(grid * scale),
        ..default()
    });
    commands.insert_resource(GridTexture(handle));
}

/// Repaint the texture from the grid when the simulation advanced
pub fn update_grid_texture(
    sim: Res<WatorSim>,
    texture: Res<GridTexture>,
    mut images: ResMut<Assets<Image>>,
) {
    if !sim.is_changed() {
        return;
    }
    let Some(image) = images.get_mut(&texture.0) else {
        return;
    };

    let pixels: &mut [[u8; 4]] = bytemuck::cast_slice_mut(&mut image.data);
    for (pixel, cell) in pixels.iter_mut().zip(sim.cells.iter()) {
        *pixel = match cell.map(|agent| agent.kind) {
            Some(AgentKind::Fish) => FISH,
            Some(AgentKind::Shark) => SHARK,
            None => WATER,
        };
    }
}

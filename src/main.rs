use std::time::Instant;

use clap::Parser;
use photonforge::config::RenderConfig;
use photonforge::error::RenderError;
use photonforge::scene::{scenes, Scene};
use photonforge::{photon, post, render};

fn main() -> Result<(), RenderError> {
    env_logger::init();

    let config = RenderConfig::parse().validated()?;

    let objects = scenes::build(&config.scene);
    let scene = Scene::new(config.fov, config.width, config.height, objects);

    log::info!("building photon maps");
    let start = Instant::now();
    let (diffuse_tree, caustic_tree) = photon::generate_maps(&scene.objects, config.seed);
    log::info!(
        "photon maps built in {:.2}s ({} diffuse, {} caustic photon hits)",
        start.elapsed().as_secs_f64(),
        diffuse_tree.len(),
        caustic_tree.len()
    );

    log::info!("tracing eye rays");
    let start = Instant::now();
    let buffer = render::render(&scene, &diffuse_tree, &caustic_tree, config.rays, config.depth, config.chunks, config.seed)?;
    log::info!("eye pass completed in {:.2}s", start.elapsed().as_secs_f64());

    let bloomed = post::bloom(&buffer, config.bloom);
    let image = post::compose(&buffer, &bloomed, config.gamma);
    image.save(&config.out)?;

    log::info!("wrote {}", config.out);
    Ok(())
}

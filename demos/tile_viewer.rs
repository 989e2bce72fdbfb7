use macroquad::prelude::*;
use tiled_instancer::{FrameDriver, FrameInput, FrameParams, FsPlatform, GameConfig, MacroquadImageDecoder, MiniquadRenderer};

fn window_conf() -> Conf {
    Conf {
        window_title: "Tile Viewer".into(),
        window_width: 1280,
        window_height: 720,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = GameConfig::load("assets/config.json").expect("Failed to load config");
    let mut driver = FrameDriver::new(
        config,
        Box::new(FsPlatform::new("assets")),
        Box::new(MacroquadImageDecoder),
    );
    let mut renderer = MiniquadRenderer::new();

    loop {
        let params = FrameParams {
            screen_width: screen_width() as u32,
            screen_height: screen_height() as u32,
            delta_time: get_frame_time(),
            input: FrameInput {
                left: is_key_down(KeyCode::Left),
                right: is_key_down(KeyCode::Right),
            },
        };
        driver.update_and_render(&mut renderer, &params);

        draw_text(&format!("FPS: {}", get_fps()), 20.0, 30.0, 30.0, WHITE);

        next_frame().await;
    }
}

//! Cross-module scenarios: scene graph, render dispatch and the driver
//! working together on the headless backend

mod frame_loop;
mod render_dispatch;
mod scene_graph;

use kiln::flow::{run, FlowConstructor, GraphicsFlow};
use kiln::scenes::instancing::InstancingScene;
use kiln::scenes::SceneEvent;

fn main() -> anyhow::Result<()> {
    let constructor: FlowConstructor<(), SceneEvent> = Box::new(|ctx| {
        Box::pin(async move {
            match InstancingScene::new(&ctx).await {
                Ok(scene) => Box::new(scene) as Box<dyn GraphicsFlow<(), SceneEvent>>,
                Err(e) => panic!("Failed to initialize the scene: {}", e),
            }
        })
    });
    run(vec![constructor])
}

use storyboard_runtime::ecs::{Behavior, BehaviorChain, EcsWorld};
use storyboard_runtime::scene::{CueAction, CueData, SceneClipData, SceneError, StoryboardData, StoryboardScene};
use storyboard_runtime::{AnimationCommand, StoryboardEvent};

const INTRO_SCENE: &str = "fixtures/scenes/intro_sequence.json";

fn clip(name: &str, duration_ms: u64) -> SceneClipData {
    SceneClipData { name: name.to_string(), duration_ms, looped: false, speed: 1.0 }
}

fn board(name: &str, scenes: Vec<SceneClipData>) -> StoryboardData {
    StoryboardData { name: name.to_string(), endless: false, behaviors: Vec::new(), scenes }
}

#[test]
fn fixture_scene_loads_and_validates() {
    let scene = StoryboardScene::load(INTRO_SCENE).expect("fixture scene should load");
    assert_eq!(scene.storyboards.len(), 3);
    assert_eq!(scene.detached_scenes.len(), 1);
    assert_eq!(scene.cues.len(), 7);
    let spinner = &scene.storyboards[1];
    assert!(spinner.endless);
    assert_eq!(spinner.behaviors.len(), 2);
    assert_eq!(scene.storyboards[0].scenes[1].speed, 2.0);
    assert_eq!(scene.storyboards[0].scenes[0].speed, 1.0, "speed defaults to 1");
    scene.validate().expect("fixture scene is consistent");
}

#[test]
fn scene_json_roundtrip_preserves_layout() {
    let scene = StoryboardScene::load(INTRO_SCENE).expect("fixture scene should load");
    let json = scene.to_json_pretty().expect("scene should serialize");
    let reloaded = StoryboardScene::from_json_slice(json.as_bytes()).expect("serialized scene should parse");
    assert_eq!(reloaded, scene);
}

#[test]
fn missing_scene_file_reports_path() {
    let err = StoryboardScene::load("fixtures/scenes/does_not_exist.json").expect_err("missing file must fail");
    assert!(format!("{err:#}").contains("does_not_exist.json"));
}

#[test]
fn validate_rejects_duplicates_and_dangling_cues() {
    let duplicate_board = StoryboardScene {
        storyboards: vec![board("intro", vec![clip("a", 10)]), board("intro", vec![clip("b", 10)])],
        ..StoryboardScene::default()
    };
    assert_eq!(duplicate_board.validate(), Err(SceneError::DuplicateStoryboard("intro".into())));

    let duplicate_scene = StoryboardScene {
        storyboards: vec![board("intro", vec![clip("a", 10)])],
        detached_scenes: vec![clip("a", 10)],
        ..StoryboardScene::default()
    };
    assert_eq!(duplicate_scene.validate(), Err(SceneError::DuplicateScene("a".into())));

    let dangling_scene = StoryboardScene {
        storyboards: vec![board("intro", vec![clip("a", 10)])],
        cues: vec![CueData { at_ms: 40, action: CueAction::RegisterScene { scene: "missing".into() } }],
        ..StoryboardScene::default()
    };
    assert_eq!(
        dangling_scene.validate(),
        Err(SceneError::UnknownScene { at_ms: 40, name: "missing".into() })
    );

    let dangling_board = StoryboardScene {
        storyboards: vec![board("intro", vec![clip("a", 10)])],
        cues: vec![CueData { at_ms: 5, action: CueAction::UnregisterStoryboard { storyboard: "outro".into() } }],
        ..StoryboardScene::default()
    };
    let err = dangling_board.validate().expect_err("unknown storyboard");
    assert_eq!(err.to_string(), "cue at 5ms refers to unknown storyboard 'outro'");

    let mut ecs = EcsWorld::new();
    assert!(dangling_board.spawn_into(&mut ecs).is_err(), "invalid scenes are not spawned");
}

#[test]
fn spawn_builds_behavior_chains_and_sorted_cues() {
    let scene = StoryboardScene::load(INTRO_SCENE).expect("fixture scene should load");
    let mut ecs = EcsWorld::new();
    let spawned = scene.spawn_into(&mut ecs).expect("fixture scene should spawn");

    let spinner = spawned.storyboards["spinner"];
    let chain = ecs.world.get::<BehaviorChain>(spinner).expect("spinner node has behaviors");
    assert_eq!(chain.0.len(), 3);
    assert!(matches!(chain.0[0], Behavior::Trigger(ref name) if name == "loading"));
    assert_eq!(chain.0[1], Behavior::Visibility { visible: true });
    assert_eq!(chain.first_storyboard(), Some(spinner));
    assert!(ecs.storyboard(spinner).expect("storyboard component").is_endless());

    assert_eq!(ecs.resolve_storyboard(spawned.scenes["logo_fade"]), Some(spawned.storyboards["intro"]));
    assert_eq!(ecs.resolve_storyboard(spawned.scenes["spinner_turn"]), Some(spinner));
    assert_eq!(ecs.resolve_storyboard(spawned.scenes["stray_glow"]), None, "detached scenes have no storyboard");

    let cues = spawned.cues();
    assert_eq!(cues.len(), 7);
    assert!(cues.windows(2).all(|pair| pair[0].at_ms <= pair[1].at_ms));
    assert_eq!(cues[0].command, AnimationCommand::RegisterScene { scene: spawned.scenes["logo_fade"] });
    assert_eq!(
        cues[5].command,
        AnimationCommand::UnregisterStoryboard { storyboard: spawned.storyboards["ambient"] }
    );
}

#[test]
fn cues_dispatch_only_when_due() {
    let scene = StoryboardScene::load(INTRO_SCENE).expect("fixture scene should load");
    let mut ecs = EcsWorld::new();
    let mut spawned = scene.spawn_into(&mut ecs).expect("fixture scene should spawn");
    assert_eq!(spawned.dispatch_due(&ecs, 0), 3);
    assert_eq!(ecs.pending_commands(), 3);
    assert_eq!(spawned.dispatch_due(&ecs, 99), 0);
    assert_eq!(spawned.dispatch_due(&ecs, 100), 2);
    assert_eq!(spawned.remaining_cues(), 2);
    assert_eq!(spawned.dispatch_due(&ecs, 10_000), 2);
    assert_eq!(spawned.remaining_cues(), 0);
    assert_eq!(spawned.dispatch_due(&ecs, 20_000), 0);
}

#[test]
fn fixture_scene_plays_through() {
    let scene = StoryboardScene::load(INTRO_SCENE).expect("fixture scene should load");
    let mut ecs = EcsWorld::new();
    let mut spawned = scene.spawn_into(&mut ecs).expect("fixture scene should spawn");
    let intro = spawned.storyboards["intro"];
    let spinner = spawned.storyboards["spinner"];
    let ambient = spawned.storyboards["ambient"];

    let mut events = Vec::new();
    spawned.dispatch_due(&ecs, ecs.now());
    while ecs.now() < 2_032 {
        let now = ecs.step(16);
        events.extend(ecs.drain_events());
        spawned.dispatch_due(&ecs, now);
        if now == 320 {
            assert!(ecs.is_storyboard_running(intro), "logo fade runs for 400ms");
            assert!(!ecs.is_storyboard_running(spinner), "spinner turn finished at 256ms");
            assert!(ecs.is_storyboard_running(ambient));
        }
    }

    assert_eq!(spawned.remaining_cues(), 0);
    assert!(events.contains(&StoryboardEvent::changed(intro, true)));
    assert!(events.contains(&StoryboardEvent::changed(intro, false)));
    assert!(events.contains(&StoryboardEvent::changed(ambient, true)));
    assert!(events.contains(&StoryboardEvent::ResolveFailed { scene: spawned.scenes["stray_glow"] }));
    assert!(events.contains(&StoryboardEvent::RegistryCleared { entries: 1 }));

    assert!(!ecs.is_storyboard_active(intro));
    assert!(ecs.is_storyboard_active(spinner), "endless storyboards restart after finishing");
    assert_eq!(ecs.storyboard(spinner).map(|board| board.revision()), Some(3));
    assert!(ecs.active_animations().expect("driver installed").is_empty());

    let stats = ecs.stats();
    assert_eq!(stats.resolve_failures, 1);
    assert_eq!(stats.full_clears, 1);
    assert_eq!(stats.compactions, 0);
    assert_eq!(stats.commands_applied, 7);
}

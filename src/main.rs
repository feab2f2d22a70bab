use std::{env, fs, io, path::PathBuf};

use log::info;
use rand::{SeedableRng, rngs::StdRng};
use serde::Deserialize;

use rbm_recommender::{
    dataset::RatingDataset,
    recommend::DEFAULT_TOP_K,
    specs::{ModelSpec, TrainingSpec},
    training::TrainerBuilder,
};

fn default_test_ratio() -> f32 {
    0.2
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

/// Everything a single run needs, read from the JSON file given as the first argument.
#[derive(Debug, Deserialize)]
struct SessionSpec {
    model: ModelSpec,
    training: TrainingSpec,
    max_rating: f32,
    users: Vec<Vec<(usize, f32)>>,
    #[serde(default = "default_test_ratio")]
    test_ratio: f32,
    snapshot: Option<PathBuf>,
    recommend_for: Option<usize>,
    #[serde(default = "default_top_k")]
    top_k: usize,
}

fn main() -> io::Result<()> {
    env_logger::init();

    let path = env::args().nth(1).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "usage: rbm-recommender <session.json>",
        )
    })?;

    let session: SessionSpec = serde_json::from_str(&fs::read_to_string(&path)?)?;
    info!("loaded session from {path} with {} users", session.users.len());

    let dataset = RatingDataset::from_user_ratings(
        session.model.visible_count,
        session.max_rating,
        session.users.iter().map(Vec::as_slice),
    )?;

    let mut rng = match session.training.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let (train, test) = dataset.split(session.test_ratio, &mut rng)?;
    info!("train users = {}, test users = {}", train.len(), test.len());

    let builder = TrainerBuilder::new();
    let mut trainer = builder.build_with_rng(&session.model, &session.training, train, rng)?;
    trainer.train()?;

    if !test.is_empty() {
        trainer.evaluate(&test)?;
    }

    if let Some(path) = &session.snapshot {
        let json = serde_json::to_string_pretty(&trainer.rbm().snapshot())?;
        fs::write(path, json)?;
        info!("snapshot written to {}", path.display());
    }

    if let Some(user) = session.recommend_for {
        let ratings = session.users.get(user).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("there is no user {user}"),
            )
        })?;

        let top = trainer.recommend(ratings, session.max_rating, session.top_k)?;
        println!("{top:?}");
    }

    Ok(())
}

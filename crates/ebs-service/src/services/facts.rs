//! Static animal fact lists.
//!
//! Local collaborator for the random fact endpoint: no network involved, just
//! fixed lists and a uniform pick.

use rand::seq::SliceRandom;
use std::str::FromStr;
use thiserror::Error;

/// Animal kind a broadcaster can configure for their channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimalKind {
    Cat,
    Dog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown animal kind")]
pub struct UnknownAnimalKind;

impl FromStr for AnimalKind {
    type Err = UnknownAnimalKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cat" => Ok(AnimalKind::Cat),
            "dog" => Ok(AnimalKind::Dog),
            _ => Err(UnknownAnimalKind),
        }
    }
}

// Taken from https://catfact.ninja/
const CAT_FACTS: &[&str] = &[
    "In the 1750s, Europeans introduced cats into the Americas to control pests.",
    "Statistics indicate that animal lovers in recent years have shown a preference for cats over dogs!",
    "Like humans, cats tend to favor one paw over another",
    "A female cat is called a queen or a molly.",
    "It has been scientifically proven that stroking a cat can lower one's blood pressure.",
];

// Taken from https://github.com/kinduff/dog-api/blob/master/db/seeds.rb
const DOG_FACTS: &[&str] = &[
    "Dogs have sweat glands in between their paws.",
    "During the Middle Ages, Great Danes and Mastiffs were sometimes suited with armor and spiked collars to enter a battle or to defend supply caravans.",
    "Your pup reaches his full size between 12 and 24 months.",
    "Chihuahuas are born with soft spots in their skulls, just like human babies.",
    "Obesity is the top health problem among dogs.",
];

const DEFAULT_FACT: &str = "Animals are our friends.";

/// Handles requests for animal facts.
#[derive(Debug, Clone, Copy, Default)]
pub struct FactsService;

impl FactsService {
    pub fn new() -> Self {
        Self
    }

    /// A uniformly random fact for the given kind.
    pub fn random_fact(&self, kind: AnimalKind) -> &'static str {
        let facts = match kind {
            AnimalKind::Cat => CAT_FACTS,
            AnimalKind::Dog => DOG_FACTS,
        };

        facts
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(DEFAULT_FACT)
    }

    /// A fact applicable to every kind; also seeds the global segment at
    /// startup and serves channels that have not configured a kind yet.
    pub fn default_fact(&self) -> &'static str {
        DEFAULT_FACT
    }
}

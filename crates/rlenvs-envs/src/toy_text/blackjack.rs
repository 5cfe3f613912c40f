//! Blackjack card game.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rlenvs::env::{Action, Environment, Info, Observation, StepOutcome};
use rlenvs::factory::{EnvFactory, MakeOptions};
use rlenvs::spaces::{ActionSpace, DiscreteSpace};
use rlenvs::{EnvError, Result};

const STICK: i64 = 0;
const HIT: i64 = 1;

fn action_labels() -> DiscreteSpace {
    DiscreteSpace::new(vec!["STICK", "HIT"])
}

/// Infinite deck: ace counts as 1, face cards as 10.
fn draw_card(rng: &mut StdRng) -> u32 {
    rng.gen_range(1..=13).min(10)
}

fn has_usable_ace(hand: &[u32]) -> bool {
    hand.contains(&1) && hand.iter().sum::<u32>() + 10 <= 21
}

fn sum_hand(hand: &[u32]) -> u32 {
    let raw: u32 = hand.iter().sum();
    if has_usable_ace(hand) {
        raw + 10
    } else {
        raw
    }
}

fn is_bust(hand: &[u32]) -> bool {
    hand.iter().sum::<u32>() > 21
}

fn score(hand: &[u32]) -> u32 {
    if is_bust(hand) {
        0
    } else {
        sum_hand(hand)
    }
}

fn is_natural(hand: &[u32]) -> bool {
    hand.len() == 2 && hand.contains(&1) && hand.contains(&10)
}

/// Blackjack environment
///
/// Cards are drawn with replacement. The player hits until sticking or
/// going bust, then the dealer draws to 17 and hands are compared.
///
/// Observation: (player sum, dealer showing card, usable ace flag)
/// Actions: 0 = stick, 1 = hit
pub struct Blackjack {
    player: Vec<u32>,
    dealer: Vec<u32>,
    natural: bool,
    sab: bool,
    rng: StdRng,
}

impl Blackjack {
    pub fn new(natural: bool, sab: bool) -> Self {
        Self {
            player: Vec::new(),
            dealer: Vec::new(),
            natural,
            sab,
            rng: StdRng::from_entropy(),
        }
    }

    fn observation(&self) -> Observation {
        Observation::Tuple(vec![
            sum_hand(&self.player) as i64,
            self.dealer[0] as i64,
            has_usable_ace(&self.player) as i64,
        ])
    }
}

impl Environment for Blackjack {
    fn name(&self) -> &'static str {
        "Blackjack"
    }

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Discrete(action_labels())
    }

    fn reset(&mut self, seed: Option<u64>, _options: &Info) -> (Observation, Info) {
        if let Some(s) = seed {
            self.rng = StdRng::seed_from_u64(s);
        }
        self.dealer = vec![draw_card(&mut self.rng), draw_card(&mut self.rng)];
        self.player = vec![draw_card(&mut self.rng), draw_card(&mut self.rng)];
        (self.observation(), Info::new())
    }

    fn step(&mut self, action: &Action) -> StepOutcome {
        let code = match action {
            Action::Discrete(a) => *a,
            _ => unreachable!("validated against the discrete space"),
        };
        let (reward, terminated) = if code == HIT {
            self.player.push(draw_card(&mut self.rng));
            if is_bust(&self.player) {
                (-1.0, true)
            } else {
                (0.0, false)
            }
        } else {
            while sum_hand(&self.dealer) < 17 {
                self.dealer.push(draw_card(&mut self.rng));
            }
            let mut reward = match score(&self.player).cmp(&score(&self.dealer)) {
                std::cmp::Ordering::Greater => 1.0,
                std::cmp::Ordering::Equal => 0.0,
                std::cmp::Ordering::Less => -1.0,
            };
            if self.sab {
                // Sutton & Barto rules: a natural only beats a dealer natural
                if is_natural(&self.player) && !is_natural(&self.dealer) {
                    reward = 1.0;
                }
            } else if self.natural && is_natural(&self.player) && reward == 1.0 {
                reward = 1.5;
            }
            (reward, true)
        };

        StepOutcome {
            observation: self.observation(),
            reward,
            terminated,
            truncated: false,
            info: Info::new(),
        }
    }
}

/// Constructs Blackjack instances; options: `natural`, `sab`.
pub struct BlackjackFactory;

impl EnvFactory for BlackjackFactory {
    type Env = Blackjack;

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Discrete(action_labels())
    }

    fn make(&self, version: &str, options: &MakeOptions) -> Result<Blackjack> {
        if version != "v1" {
            return Err(EnvError::Construction(format!(
                "Environment Blackjack-{version} doesn't exist"
            )));
        }
        Ok(Blackjack::new(
            options.bool_or("natural", false)?,
            options.bool_or("sab", false)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hand_scoring() {
        assert_eq!(sum_hand(&[1, 7]), 18);
        assert_eq!(sum_hand(&[1, 7, 10]), 18);
        assert_eq!(sum_hand(&[10, 9, 5]), 24);
        assert!(has_usable_ace(&[1, 5]));
        assert!(!has_usable_ace(&[1, 5, 10]));
        assert!(is_natural(&[1, 10]));
        assert!(!is_natural(&[1, 5]));
    }

    #[test]
    fn test_reset_observation_shape() {
        let mut env = Blackjack::new(false, false);
        let (obs, _) = env.reset(Some(7), &Info::new());
        match obs {
            Observation::Tuple(values) => {
                assert_eq!(values.len(), 3);
                assert!((2..=21).contains(&values[0]));
                assert!((1..=10).contains(&values[1]));
                assert!(values[2] == 0 || values[2] == 1);
            }
            other => panic!("unexpected observation {other:?}"),
        }
    }

    #[test]
    fn test_hitting_to_bust_loses() {
        let mut env = Blackjack::new(false, false);
        env.reset(Some(7), &Info::new());
        // drawing forever always busts eventually
        for _ in 0..30 {
            let out = env.step(&Action::Discrete(HIT));
            if out.terminated {
                assert_eq!(out.reward, -1.0);
                return;
            }
            assert_eq!(out.reward, 0.0);
        }
        panic!("never went bust after 30 hits");
    }

    #[test]
    fn test_stick_ends_episode_with_unit_reward() {
        for seed in 0..20 {
            let mut env = Blackjack::new(false, false);
            env.reset(Some(seed), &Info::new());
            let out = env.step(&Action::Discrete(STICK));
            assert!(out.terminated);
            assert!(!out.truncated);
            assert!([-1.0, 0.0, 1.0].contains(&out.reward));
        }
    }

    #[test]
    fn test_natural_payout_is_larger() {
        let mut env = Blackjack::new(true, false);
        env.reset(Some(0), &Info::new());
        env.player = vec![1, 10];
        env.dealer = vec![5, 9];
        let out = env.step(&Action::Discrete(STICK));
        assert!(out.terminated);
        assert!(out.reward == 1.5 || out.reward == -1.0 || out.reward == 0.0);
    }

    #[test]
    fn test_no_transition_table() {
        let env = Blackjack::new(false, false);
        assert!(env.transition_table().is_none());
    }
}

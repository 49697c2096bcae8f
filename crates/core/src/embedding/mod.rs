//! Per-function embedding generation.
//!
//! Every call trains a fresh word-embedding model from scratch, using only the
//! given function's own tokens as the training corpus. Nothing is shared
//! across calls, so vectors from different functions do not live in a common
//! trained space; distances between them are only weakly meaningful. That is
//! the established behavior of this system and is preserved deliberately: do
//! not swap in a shared incrementally-trained model without revisiting the
//! matching semantics.

use std::collections::HashMap;

use crate::model::VECTOR_DIM;

/// Fixed RNG seed for weight initialization and negative sampling.
///
/// Training must be deterministic per input: byte-identical code has to embed
/// to the identical vector so that a re-query of learned code ranks it at
/// distance zero.
const EMBED_SEED: u64 = 0x5eed_cafe_f00d_0001;

/// Trains a small skip-gram model over one function's tokens and produces a
/// fixed-length vector for the function.
#[derive(Debug, Clone)]
pub struct Embedder {
    /// Output vector length.
    pub dim: usize,
    /// Max distance between a center token and a context token.
    pub window: usize,
    /// Minimum occurrences for a token to enter the vocabulary.
    pub min_count: usize,
    /// Full passes over the token lines.
    pub epochs: usize,
    /// Negative samples per (center, context) pair.
    pub negative: usize,
    /// Gradient step size.
    pub learning_rate: f32,
}

impl Default for Embedder {
    fn default() -> Self {
        Self {
            dim: VECTOR_DIM,
            window: 5,
            min_count: 1,
            epochs: 5,
            negative: 5,
            learning_rate: 0.025,
        }
    }
}

impl Embedder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Embed one function's code lines into a vector of exactly `self.dim`.
    ///
    /// Pipeline: tokenize each line on whitespace, train a fresh skip-gram
    /// model over the token lines, sum the trained vector of every
    /// in-vocabulary token occurrence, then divide by the number of token
    /// lines. The divisor is line count, not token count; that coarse
    /// normalization is part of the established contract.
    ///
    /// Zero token lines skip the division and the result is the zero vector.
    /// The final pad/truncate to `self.dim` is defensive; the sum is already
    /// that length.
    pub fn embed(&self, lines: &[String]) -> Vec<f32> {
        let token_lines: Vec<Vec<&str>> =
            lines.iter().map(|line| line.split_whitespace().collect()).collect();

        let mut sum = vec![0.0f32; self.dim];

        let vocab = Vocabulary::build(&token_lines, self.min_count);
        if !vocab.is_empty() {
            let weights = self.train(&vocab, &token_lines);
            for line in &token_lines {
                for token in line {
                    if let Some(id) = vocab.id_of(token) {
                        for (s, w) in sum.iter_mut().zip(&weights[id]) {
                            *s += *w;
                        }
                    }
                }
            }
        }

        if !token_lines.is_empty() {
            let divisor = token_lines.len() as f32;
            for s in &mut sum {
                *s /= divisor;
            }
        }

        sum.resize(self.dim, 0.0);
        sum
    }

    /// Run skip-gram training with negative sampling and return the input
    /// weight matrix, one row per vocabulary entry.
    fn train(&self, vocab: &Vocabulary, token_lines: &[Vec<&str>]) -> Vec<Vec<f32>> {
        let mut rng = fastrand::Rng::with_seed(EMBED_SEED);

        let n = vocab.len();
        let span = 1.0 / self.dim as f32;
        let mut input: Vec<Vec<f32>> = (0..n)
            .map(|_| (0..self.dim).map(|_| (rng.f32() - 0.5) * span).collect())
            .collect();
        let mut output: Vec<Vec<f32>> = vec![vec![0.0; self.dim]; n];

        // Pre-resolve token lines to vocabulary ids once.
        let id_lines: Vec<Vec<usize>> = token_lines
            .iter()
            .map(|line| line.iter().filter_map(|t| vocab.id_of(t)).collect())
            .collect();

        let mut err = vec![0.0f32; self.dim];
        for _ in 0..self.epochs {
            for line in &id_lines {
                for (pos, &center) in line.iter().enumerate() {
                    let lo = pos.saturating_sub(self.window);
                    let hi = (pos + self.window + 1).min(line.len());
                    for ctx_pos in lo..hi {
                        if ctx_pos == pos {
                            continue;
                        }
                        let context = line[ctx_pos];

                        err.iter_mut().for_each(|e| *e = 0.0);
                        for k in 0..=self.negative {
                            let (target, label) = if k == 0 {
                                (context, 1.0)
                            } else {
                                let sample = rng.usize(0..n);
                                if sample == context {
                                    continue;
                                }
                                (sample, 0.0)
                            };

                            let dot: f32 = input[center]
                                .iter()
                                .zip(&output[target])
                                .map(|(a, b)| a * b)
                                .sum();
                            let grad = (label - sigmoid(dot)) * self.learning_rate;
                            for d in 0..self.dim {
                                err[d] += grad * output[target][d];
                                output[target][d] += grad * input[center][d];
                            }
                        }
                        for d in 0..self.dim {
                            input[center][d] += err[d];
                        }
                    }
                }
            }
        }

        input
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Vocabulary for a single training call, ids assigned in first-seen order so
/// training stays deterministic.
struct Vocabulary {
    ids: HashMap<String, usize>,
}

impl Vocabulary {
    fn build(token_lines: &[Vec<&str>], min_count: usize) -> Self {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for line in token_lines {
            for token in line {
                *counts.entry(token).or_insert(0) += 1;
            }
        }

        let mut ids = HashMap::new();
        for line in token_lines {
            for token in line {
                if counts[token] >= min_count && !ids.contains_key(*token) {
                    let next = ids.len();
                    ids.insert((*token).to_string(), next);
                }
            }
        }
        Self { ids }
    }

    fn id_of(&self, token: &str) -> Option<usize> {
        self.ids.get(token).copied()
    }

    fn len(&self) -> usize {
        self.ids.len()
    }

    fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

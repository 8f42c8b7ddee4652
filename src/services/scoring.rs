use crate::domain::{ClipCandidate, GameVideo, GAMEPLAY_CAP, TRAILER_CAP};

const TRAILER_KEYWORDS: &[&str] = &["trailer", "reveal", "announcement", "launch"];
const GAMEPLAY_KEYWORDS: &[&str] = &["gameplay", "walkthrough", "playthrough"];
// Live-service mode trailers and DLC spots masquerade as base-game clips.
const NEGATIVE_KEYWORDS: &[(&str, i32)] = &[("online", -2), ("update", -3), ("dlc", -3)];

pub fn score_clip_title(title: &str) -> i32 {
    let lower = title.to_lowercase();
    let mut score = 0;
    if lower.contains("official") {
        score += 3;
    }
    for keyword in TRAILER_KEYWORDS {
        if lower.contains(keyword) {
            score += 2;
        }
    }
    for (keyword, weight) in NEGATIVE_KEYWORDS {
        if lower.contains(keyword) {
            score += weight;
        }
    }
    score
}

fn is_trailer_like(title: &str) -> bool {
    let lower = title.to_lowercase();
    TRAILER_KEYWORDS.iter().any(|k| lower.contains(k))
}

fn is_gameplay_like(title: &str) -> bool {
    let lower = title.to_lowercase();
    GAMEPLAY_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Classify provider clips into trailers and gameplay footage. Sorting is
/// by score descending with the provider's original order as tie-break, so
/// the same candidate set always classifies the same way.
pub fn classify_clips(candidates: Vec<ClipCandidate>) -> (Vec<GameVideo>, Vec<GameVideo>) {
    let mut scored: Vec<(usize, i32, ClipCandidate)> = candidates
        .into_iter()
        .enumerate()
        .map(|(index, clip)| (index, score_clip_title(&clip.title), clip))
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut trailers = Vec::new();
    let mut gameplay = Vec::new();
    for (_, score, clip) in scored {
        if trailers.len() < TRAILER_CAP && is_trailer_like(&clip.title) {
            trailers.push(to_video(clip, score));
        } else if gameplay.len() < GAMEPLAY_CAP && is_gameplay_like(&clip.title) {
            gameplay.push(to_video(clip, score));
        }
    }
    (trailers, gameplay)
}

fn to_video(clip: ClipCandidate, score: i32) -> GameVideo {
    GameVideo {
        title: clip.title,
        url: clip.url,
        preview: clip.preview,
        source: clip.source,
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::VideoSource;

    fn candidate(title: &str) -> ClipCandidate {
        ClipCandidate {
            title: title.to_string(),
            url: format!("https://cdn.example.com/{}.mp4", title.replace(' ', "-")),
            preview: None,
            source: VideoSource::Provider,
        }
    }

    #[test]
    fn official_trailers_outrank_mode_spots() {
        assert!(score_clip_title("Official Launch Trailer") > score_clip_title("Online Mode Trailer"));
        assert!(score_clip_title("DLC Update Trailer") < score_clip_title("Reveal Trailer"));
    }

    #[test]
    fn classification_is_deterministic() {
        let titles = vec![
            "Gameplay Walkthrough Part 1",
            "Official Reveal Trailer",
            "Online Heists Trailer",
            "Launch Trailer",
            "Title Update DLC Trailer",
        ];
        let run = |titles: &[&str]| {
            classify_clips(titles.iter().map(|t| candidate(t)).collect::<Vec<_>>())
        };

        let (trailers_a, gameplay_a) = run(&titles);
        let (trailers_b, gameplay_b) = run(&titles);
        assert_eq!(trailers_a, trailers_b);
        assert_eq!(gameplay_a, gameplay_b);

        // Best-scored trailer comes first; the mode spot sinks to the back.
        assert_eq!(trailers_a[0].title, "Official Reveal Trailer");
        assert_eq!(trailers_a.last().unwrap().title, "Title Update DLC Trailer");
        assert_eq!(gameplay_a.len(), 1);
        assert_eq!(gameplay_a[0].title, "Gameplay Walkthrough Part 1");
    }

    #[test]
    fn caps_are_enforced() {
        let candidates: Vec<ClipCandidate> = (0..10)
            .map(|i| candidate(&format!("Trailer {i}")))
            .chain((0..5).map(|i| candidate(&format!("Gameplay {i}"))))
            .collect();

        let (trailers, gameplay) = classify_clips(candidates);
        assert_eq!(trailers.len(), TRAILER_CAP);
        assert_eq!(gameplay.len(), GAMEPLAY_CAP);
    }

    #[test]
    fn keyword_free_clips_are_dropped() {
        let (trailers, gameplay) = classify_clips(vec![candidate("Behind the scenes")]);
        assert!(trailers.is_empty());
        assert!(gameplay.is_empty());
    }
}

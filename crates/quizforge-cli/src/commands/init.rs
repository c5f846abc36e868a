//! The `quizforge init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create quizforge.toml
    if std::path::Path::new("quizforge.toml").exists() {
        println!("quizforge.toml already exists, skipping.");
    } else {
        std::fs::write("quizforge.toml", SAMPLE_CONFIG)?;
        println!("Created quizforge.toml");
    }

    // Create example bank
    std::fs::create_dir_all("banks")?;
    let example_path = std::path::Path::new("banks/example.json");
    if example_path.exists() {
        println!("banks/example.json already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_BANK)?;
        println!("Created banks/example.json");
    }

    println!("\nNext steps:");
    println!("  1. Add your own questions under banks/");
    println!("  2. Run: quizforge validate --bank banks");
    println!("  3. Run: quizforge run --bank banks");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizforge configuration

session_length = 15
output_dir = "./quizforge-results"
report_formats = ["json", "html"]

[engine]
epsilon = 0.1
learning_rate = 0.1
discount_factor = 0.9
repetition_offsets_minutes = [5, 25, 120]
recent_window = 5
challenging_count = 3
include_question_details = true
# seed = 42
"#;

const EXAMPLE_BANK: &str = r#"[
  {
    "id": 1,
    "question": "Which data structure serves elements in first-in, first-out order?",
    "options": {"A": "Queue", "B": "Stack", "C": "Heap", "D": "Tree"},
    "correctAnswer": "A",
    "explanation": "A queue removes elements in the order they were added.",
    "difficulty": "Easy",
    "related_topics": ["data structures"],
    "related_links": []
  },
  {
    "id": 2,
    "question": "What does HTTP status code 404 mean?",
    "options": {"A": "Server error", "B": "Not found", "C": "Redirect", "D": "Unauthorized"},
    "correctAnswer": "B",
    "explanation": "404 means the server could not find the requested resource.",
    "difficulty": "Easy",
    "related_topics": ["http"],
    "related_links": []
  },
  {
    "id": 3,
    "question": "What is the average-case lookup cost of a hash map?",
    "options": {"A": "O(n)", "B": "O(log n)", "C": "O(1)", "D": "O(n log n)"},
    "correctAnswer": "C",
    "explanation": "With a good hash function lookups take constant time on average.",
    "difficulty": "Medium",
    "related_topics": ["data structures", "complexity"],
    "related_links": []
  },
  {
    "id": 4,
    "question": "Which transport protocol guarantees in-order delivery?",
    "options": {"A": "UDP", "B": "ICMP", "C": "ARP", "D": "TCP"},
    "correctAnswer": "D",
    "explanation": "TCP sequences segments and retransmits lost ones.",
    "difficulty": "Medium",
    "related_topics": ["networking"],
    "related_links": []
  },
  {
    "id": 5,
    "question": "Which consensus algorithm elects a leader using randomized election timeouts?",
    "options": {"A": "Paxos", "B": "Raft", "C": "Two-phase commit", "D": "Gossip"},
    "correctAnswer": "B",
    "explanation": "Raft followers become candidates after a randomized timeout.",
    "difficulty": "Hard",
    "related_topics": ["distributed systems"],
    "related_links": []
  },
  {
    "id": 6,
    "question": "What is the worst-case time of quicksort with a naive pivot choice?",
    "options": {"A": "O(n log n)", "B": "O(n)", "C": "O(n^2)", "D": "O(log n)"},
    "correctAnswer": "C",
    "explanation": "Already-sorted input with a first-element pivot degrades to quadratic time.",
    "difficulty": "Hard",
    "related_topics": ["algorithms"],
    "related_links": []
  }
]
"#;

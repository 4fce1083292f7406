use practice_core::{DifficultyFilter, Problem, ProblemSet};
use services::{SetDescriptor, ViewSink};

/// Renders navigation output to stdout. Status messages go to stderr so
/// they survive piping the problem text elsewhere.
pub struct ConsoleView;

impl ViewSink for ConsoleView {
    fn show_menu(&self, sets: &[SetDescriptor]) {
        if sets.is_empty() {
            println!("No problem sets found.");
            return;
        }
        println!("Problem sets:");
        for set in sets {
            if set.label() == set.id().as_str() {
                println!("  {}", set.id());
            } else {
                println!("  {}  ({})", set.label(), set.id());
            }
        }
    }

    fn show_problem_list(&self, set: &ProblemSet, practice_idx: usize) {
        println!();
        println!("{}", heading(set));
        for (index, problem) in set.problems().iter().enumerate() {
            let marker = if index == practice_idx { '>' } else { ' ' };
            println!(
                "{marker} {index:>3}  [{}] {}",
                problem.difficulty(),
                problem.title()
            );
        }
        if let Some(problem) = set.problem(practice_idx) {
            print_problem(problem);
        }
    }

    fn show_single_problem(&self, set: &ProblemSet, practice_idx: usize, from_menu: bool) {
        println!();
        if from_menu {
            println!(
                "{} ({} of {})",
                heading(set),
                practice_idx + 1,
                set.problem_count()
            );
        } else {
            println!("From {}:", heading(set));
        }
        if let Some(problem) = set.problem(practice_idx) {
            print_problem(problem);
        }
    }

    fn show_difficulty_options(&self, options: &[DifficultyFilter]) {
        if options.is_empty() {
            return;
        }
        let labels: Vec<String> = options.iter().map(ToString::to_string).collect();
        println!("difficulties: {}", labels.join(", "));
    }

    fn show_status(&self, message: &str) {
        eprintln!("{message}");
    }
}

fn heading(set: &ProblemSet) -> &str {
    set.title().unwrap_or_else(|| set.id().as_str())
}

fn print_problem(problem: &Problem) {
    println!();
    println!(
        "{} [{}, category {}]",
        problem.title(),
        problem.difficulty(),
        problem.category()
    );
    println!();
    println!("{}", problem.description());
    if let Some(constraints) = problem.constraints() {
        println!();
        println!("Constraints: {constraints}");
    }
    for (number, example) in problem.examples().iter().enumerate() {
        println!();
        println!("Example {}:", number + 1);
        println!("  input:  {}", example.input());
        println!("  output: {}", example.output());
    }
}

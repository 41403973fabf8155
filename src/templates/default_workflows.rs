//! Documents written by `workstate init`.

pub const DEFAULT_WORKFLOWS_YAML: &str = r#"workflows:
  - id: task
    name: Task
    goal: Take a well-scoped task from plan to reviewed change.
    creates_task: false
    phases:
      - name: planning
        goal: Understand the task and outline the approach.
        persona: planner
      - name: implement
        goal: Make the change described in the plan.
        persona: implementer
      - name: test
        goal: Verify the change with automated and manual checks.
        persona: tester
      - name: review
        goal: Get the change reviewed and address feedback.
        persona: reviewer
        requires_review: true

  - id: bug
    name: Bug
    goal: Reproduce, fix and verify a defect.
    creates_task: false
    phases:
      - name: reproduce
        goal: Capture reliable reproduction steps.
        persona: tester
      - name: diagnose
        goal: Find the root cause.
        persona: implementer
      - name: fix
        goal: Correct the root cause.
        persona: implementer
      - name: verify
        goal: Confirm the fix and guard it with a regression test.
        persona: tester
        requires_review: true

  - id: feature
    name: Feature
    goal: Design and ship a user-facing capability.
    creates_task: false
    phases:
      - name: research
        goal: Collect requirements and prior art.
        persona: planner
      - name: design
        goal: Agree on the shape of the change.
        persona: planner
        requires_review: true
      - name: implement
        goal: Build the feature.
        persona: implementer
      - name: test
        goal: Cover the feature with tests.
        persona: tester
      - name: review
        goal: Review the finished feature.
        persona: reviewer
        requires_review: true

  - id: epic
    name: Epic
    goal: Break a large initiative into tracked child tasks.
    creates_task: true
    phases:
      - name: scoping
        goal: Define outcome and boundaries.
        persona: planner
      - name: breakdown
        goal: Split the epic into child tasks and link their dependencies.
        persona: planner
        requires_review: true
      - name: tracking
        goal: Follow child tasks to completion.
        persona: planner
"#;

pub const DEFAULT_SUBAGENTS_YAML: &str = r#"subagents:
  planner:
    claude_subagent: planner
    description: Breaks work into steps and writes plans.
    when_to_use: At the start of a workflow or when scope changes.
    example_prompts:
      - Outline an approach for this task.
  implementer:
    claude_subagent: implementer
    description: Writes and changes code.
    when_to_use: Once a plan exists.
    example_prompts:
      - Implement the planned change.
  tester:
    claude_subagent: tester
    description: Writes tests and verifies behavior.
    when_to_use: After implementation, or to reproduce a defect.
    example_prompts:
      - Add tests for the new behavior.
  reviewer:
    claude_subagent: reviewer
    description: Reviews changes for correctness and style.
    when_to_use: Before a change is considered done.
    example_prompts:
      - Review the diff and list required changes.
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{parse_subagent_document, parse_workflow_document, validate_workflow_set};
    use std::path::Path;

    #[test]
    fn default_workflows_parse_and_validate() {
        let workflows = parse_workflow_document(DEFAULT_WORKFLOWS_YAML, Path::new("workflows.yaml"))
            .expect("parse defaults");
        validate_workflow_set(&workflows).expect("valid defaults");
        let ids = workflows.iter().map(|w| w.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["task", "bug", "feature", "epic"]);
        let task = &workflows[0];
        assert_eq!(
            task.phase_names().collect::<Vec<_>>(),
            vec!["planning", "implement", "test", "review"]
        );
        assert!(task.phase("review").expect("review").requires_review);
    }

    #[test]
    fn every_persona_has_a_subagent_profile() {
        let workflows = parse_workflow_document(DEFAULT_WORKFLOWS_YAML, Path::new("workflows.yaml"))
            .expect("parse defaults");
        let subagents = parse_subagent_document(DEFAULT_SUBAGENTS_YAML, Path::new("subagents.yaml"))
            .expect("parse subagents");
        for phase in workflows.iter().flat_map(|w| w.phases.iter()) {
            let persona = phase.persona.as_deref().expect("persona");
            assert!(
                subagents.iter().any(|s| s.id.as_str() == persona),
                "missing profile for {persona}"
            );
        }
    }
}

//! Table-of-contents types

use serde::{Deserialize, Serialize};

use crate::marks::SourceObject;

/// One object of a lesson, as delivered by the course system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonObject {
    pub object_id: String,
    pub block_id: String,
    pub rubric: String,
    pub name: String,
}

/// A lesson with its objects in reading order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: String,
    pub title: String,
    pub objects: Vec<LessonObject>,
}

/// A fully fetched table of contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseToc {
    pub lessons: Vec<Lesson>,
}

impl CourseToc {
    pub fn lesson(&self, lesson_id: &str) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id == lesson_id)
    }

    /// Placement input for one lesson: (rubric, source object) in order
    pub fn source_objects(&self, lesson_id: &str) -> Vec<(String, SourceObject)> {
        self.lesson(lesson_id)
            .map(|lesson| {
                lesson
                    .objects
                    .iter()
                    .map(|object| {
                        (
                            object.rubric.clone(),
                            SourceObject {
                                object_id: object.object_id.clone(),
                                block_id: object.block_id.clone(),
                            },
                        )
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

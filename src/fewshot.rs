/// One reference translation used to steer the model. Immutable, shared
/// read-only across sessions.
#[derive(Debug, Clone, Copy)]
pub struct ExamplePair {
    pub question: &'static str,
    pub query: &'static str,
}

/// Fixed demonstrations for the companies demo graph. Selection and ranking
/// are out of scope; callers get the whole set.
pub fn examples() -> &'static [ExamplePair] {
    &[
        ExamplePair {
            question: "How many organizations are there?",
            query: "MATCH (n:Organization) RETURN count(n)",
        },
        ExamplePair {
            question: "Which organizations are in the energy industry?",
            query: "MATCH (o:Organization)-[:HAS_CATEGORY]->(i:IndustryCategory {name: \"Energy\"}) RETURN o.name",
        },
        ExamplePair {
            question: "Who is the CEO of Neo4j?",
            query: "MATCH (o:Organization {name: \"Neo4j\"})-[:HAS_CEO]->(p:Person) RETURN p.name",
        },
        ExamplePair {
            question: "What are the suppliers of Siemens?",
            query: "MATCH (o:Organization {name: \"Siemens\"})-[:HAS_SUPPLIER]->(s:Organization) RETURN s.name",
        },
        ExamplePair {
            question: "Which organizations are mentioned in articles about fraud?",
            query: "MATCH (a:Article)-[:MENTIONS]->(o:Organization) WHERE a.title CONTAINS \"fraud\" RETURN DISTINCT o.name",
        },
        ExamplePair {
            question: "Where is Databricks located?",
            query: "MATCH (o:Organization {name: \"Databricks\"})-[:IN_CITY]->(c:City) RETURN c.name",
        },
    ]
}

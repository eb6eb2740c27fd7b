pub fn render_schema() -> String {
	let init = include_str!("../../../sql/init.sql");

	expand_includes(init)
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"00_extensions.sql" => out.push_str(include_str!("../../../sql/00_extensions.sql")),
				"tables/001_namespaces.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_namespaces.sql")),
				"tables/002_tags.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_tags.sql")),
				"tables/003_datasets.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_datasets.sql")),
				"tables/004_dataset_versions.sql" =>
					out.push_str(include_str!("../../../sql/tables/004_dataset_versions.sql")),
				"tables/005_dataset_facets.sql" =>
					out.push_str(include_str!("../../../sql/tables/005_dataset_facets.sql")),
				"tables/006_jobs.sql" =>
					out.push_str(include_str!("../../../sql/tables/006_jobs.sql")),
				"tables/007_job_versions.sql" =>
					out.push_str(include_str!("../../../sql/tables/007_job_versions.sql")),
				"tables/008_job_facets.sql" =>
					out.push_str(include_str!("../../../sql/tables/008_job_facets.sql")),
				"tables/009_datasets_tag_mapping.sql" =>
					out.push_str(include_str!("../../../sql/tables/009_datasets_tag_mapping.sql")),
				"tables/010_jobs_tag_mapping.sql" =>
					out.push_str(include_str!("../../../sql/tables/010_jobs_tag_mapping.sql")),
				"tables/011_job_versions_io_mapping.sql" => out
					.push_str(include_str!("../../../sql/tables/011_job_versions_io_mapping.sql")),
				"views/001_datasets_view.sql" =>
					out.push_str(include_str!("../../../sql/views/001_datasets_view.sql")),
				"views/002_jobs_view.sql" =>
					out.push_str(include_str!("../../../sql/views/002_jobs_view.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}

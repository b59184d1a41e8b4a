//! Target resolution: dependent-config pulls and library propagation.
//!
//! Runs once per target, after every referent has resolved and before
//! emission. The builder guarantees the ordering, so every lookup here
//! sees final data.

use indexmap::IndexSet;

use crate::errors::GenError;
use crate::item::GraphView;
use crate::label::Label;
use crate::target::{OutputType, Target};

impl Target {
    /// Compute everything derived from this target's now-resolved deps.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::UnresolvedLabel`] if a referenced item is
    /// missing from the graph; the builder reports this before resolution
    /// normally, so hitting it here means the caller skipped the
    /// readiness check.
    pub fn on_resolved(&mut self, graph: &dyn GraphView) -> Result<(), GenError> {
        self.expand_groups(graph)?;
        self.pull_dependent_configs(graph)?;
        self.pull_inherited_libraries(graph)?;
        self.gather_libs(graph)?;
        Ok(())
    }

    fn unresolved(&self, label: &Label) -> GenError {
        GenError::UnresolvedLabel {
            label: label.clone(),
            referenced_by: self.label().clone(),
            location: self.defined_from().clone(),
        }
    }

    /// Append each group dep's own deps to this target's deps. The group
    /// stays in the list (it may carry configs of its own); consumers see
    /// its members as if declared directly.
    fn expand_groups(&mut self, graph: &dyn GraphView) -> Result<(), GenError> {
        let mut i = 0;
        while i < self.deps.len() {
            let dep_label = self.deps[i].clone();
            let dep = graph.target(&dep_label).ok_or_else(|| self.unresolved(&dep_label))?;
            if dep.output_type == OutputType::Group {
                for member in dep.deps.clone() {
                    if member != *self.label() && !self.deps.contains(&member) {
                        self.deps.push(member);
                    }
                }
            }
            i += 1;
        }
        Ok(())
    }

    /// Pull dependent configs from deps and datadeps, in declaration
    /// order, deduplicated by config identity.
    fn pull_dependent_configs(&mut self, graph: &dyn GraphView) -> Result<(), GenError> {
        let mut unique: IndexSet<Label> = self.configs.iter().cloned().collect();

        let dep_labels: Vec<Label> =
            self.deps.iter().chain(self.datadeps.iter()).cloned().collect();
        for dep_label in &dep_labels {
            let dep = graph.target(dep_label).ok_or_else(|| self.unresolved(dep_label))?;
            let pulled_all = dep.all_dependent_configs.clone();
            let pulled_direct = dep.direct_dependent_configs.clone();

            // All-dependent configs apply to us and keep flowing to our
            // own dependents.
            for config in pulled_all {
                if unique.insert(config.clone()) {
                    self.configs.push(config.clone());
                    self.all_dependent_configs.push(config);
                }
            }
            // Direct-dependent configs apply to us but are not re-exported
            // unless the dep is listed in forward_dependent_configs below.
            for config in pulled_direct {
                if unique.insert(config.clone()) {
                    self.configs.push(config);
                }
            }
        }

        let mut direct_unique: IndexSet<Label> =
            self.direct_dependent_configs.iter().cloned().collect();
        for dep_label in self.forward_dependent_configs.clone() {
            let dep = graph.target(&dep_label).ok_or_else(|| self.unresolved(&dep_label))?;
            for config in dep.direct_dependent_configs.clone() {
                if direct_unique.insert(config.clone()) {
                    self.direct_dependent_configs.push(config);
                }
            }
        }
        Ok(())
    }

    /// Collect static libraries and source sets reachable through deps.
    /// Shared libraries are link boundaries: the shared library itself is
    /// inherited, its own closure is not. Executables never propagate.
    fn pull_inherited_libraries(&mut self, graph: &dyn GraphView) -> Result<(), GenError> {
        for dep_label in self.deps.clone() {
            let dep = graph.target(&dep_label).ok_or_else(|| self.unresolved(&dep_label))?;
            match dep.output_type {
                OutputType::SharedLibrary => {
                    self.inherited_libraries.insert(dep_label);
                }
                OutputType::StaticLibrary | OutputType::SourceSet => {
                    self.inherited_libraries.insert(dep_label);
                    let pulled = dep.inherited_libraries().clone();
                    self.inherited_libraries.append(&pulled);
                }
                _ => {}
            }
        }
        debug_assert!(
            !self.inherited_libraries.contains(self.label()),
            "a target cannot inherit itself",
        );
        Ok(())
    }

    /// Union lib dirs and libs: this target's own values, then each config
    /// now applying to it, then each inherited library's accumulated sets.
    fn gather_libs(&mut self, graph: &dyn GraphView) -> Result<(), GenError> {
        self.all_lib_dirs.extend(self.config_values.lib_dirs.iter().cloned());
        self.all_libs.extend(self.config_values.libs.iter().cloned());

        for config_label in self.configs.clone() {
            let config =
                graph.config(&config_label).ok_or_else(|| self.unresolved(&config_label))?;
            self.all_lib_dirs.extend(config.values.lib_dirs.iter().cloned());
            self.all_libs.extend(config.values.libs.iter().cloned());
        }

        let inherited = self.inherited_libraries.clone();
        for lib_label in &inherited {
            let lib = graph.target(lib_label).ok_or_else(|| self.unresolved(lib_label))?;
            let (dirs, libs) = (lib.all_lib_dirs().clone(), lib.all_libs().clone());
            self.all_lib_dirs.append(&dirs);
            self.all_libs.append(&libs);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::config::Config;
    use crate::errors::Location;
    use crate::paths::SourceDir;
    use crate::toolchain::Toolchain;

    /// A pre-resolved graph for exercising propagation in isolation.
    #[derive(Default)]
    struct TestGraph {
        targets: HashMap<Label, Target>,
        configs: HashMap<Label, Config>,
    }

    impl TestGraph {
        /// Resolve the target against the graph, then store it.
        fn add(&mut self, mut target: Target) {
            target.on_resolved(self).expect("resolve");
            self.targets.insert(target.label().clone(), target);
        }

        fn add_config(&mut self, config: Config) {
            self.configs.insert(config.label().clone(), config);
        }

        fn get(&self, label: &Label) -> &Target {
            self.targets.get(label).expect("target in graph")
        }
    }

    impl GraphView for TestGraph {
        fn target(&self, label: &Label) -> Option<&Target> {
            self.targets.get(label)
        }

        fn config(&self, label: &Label) -> Option<&Config> {
            self.configs.get(label)
        }

        fn toolchain(&self, _label: &Label) -> Option<&Toolchain> {
            None
        }
    }

    fn label(name: &str) -> Label {
        Label::without_toolchain(SourceDir::new("//foo/"), name)
    }

    fn target(name: &str, output_type: OutputType) -> Target {
        let mut t = Target::new(label(name), Location::default());
        t.output_type = output_type;
        t
    }

    fn config_with_libs(name: &str, libs: &[&str]) -> Config {
        let mut c = Config::new(label(name), Location::default());
        c.values.libs = libs.iter().map(ToString::to_string).collect();
        c
    }

    #[test]
    fn static_chain_is_inherited_transitively() {
        let mut graph = TestGraph::default();
        graph.add(target("c", OutputType::StaticLibrary));

        let mut a = target("a", OutputType::StaticLibrary);
        a.deps.push(label("c"));
        graph.add(a);

        let mut exe = target("exe", OutputType::Executable);
        exe.deps.push(label("a"));
        graph.add(exe);

        let inherited: Vec<_> = graph.get(&label("exe")).inherited_libraries().iter().cloned().collect();
        assert_eq!(inherited, vec![label("a"), label("c")]);
    }

    #[test]
    fn shared_library_is_a_link_boundary() {
        let mut graph = TestGraph::default();
        graph.add(target("inner", OutputType::StaticLibrary));

        let mut shared = target("shared", OutputType::SharedLibrary);
        shared.deps.push(label("inner"));
        graph.add(shared);

        let mut exe = target("exe", OutputType::Executable);
        exe.deps.push(label("shared"));
        graph.add(exe);

        let exe = graph.get(&label("exe"));
        assert!(exe.inherited_libraries().contains(&label("shared")));
        assert!(!exe.inherited_libraries().contains(&label("inner")));
    }

    #[test]
    fn executables_never_propagate() {
        let mut graph = TestGraph::default();
        graph.add(target("tool", OutputType::Executable));

        let mut exe = target("exe", OutputType::Executable);
        exe.deps.push(label("tool"));
        graph.add(exe);

        assert!(graph.get(&label("exe")).inherited_libraries().is_empty());
    }

    #[test]
    fn all_dependent_configs_flow_to_every_dependent() {
        let mut graph = TestGraph::default();
        graph.add_config(config_with_libs("zconf", &["z"]));

        let mut lib = target("lib", OutputType::StaticLibrary);
        lib.all_dependent_configs.push(label("zconf"));
        graph.add(lib);

        let mut mid = target("mid", OutputType::StaticLibrary);
        mid.deps.push(label("lib"));
        graph.add(mid);

        let mut exe = target("exe", OutputType::Executable);
        exe.deps.push(label("mid"));
        graph.add(exe);

        let exe = graph.get(&label("exe"));
        assert!(exe.configs.contains(&label("zconf")));
        assert!(exe.all_dependent_configs.contains(&label("zconf")));
    }

    #[test]
    fn direct_dependent_configs_stop_after_one_hop() {
        let mut graph = TestGraph::default();
        graph.add_config(config_with_libs("dconf", &[]));

        let mut lib = target("lib", OutputType::StaticLibrary);
        lib.direct_dependent_configs.push(label("dconf"));
        graph.add(lib);

        let mut mid = target("mid", OutputType::StaticLibrary);
        mid.deps.push(label("lib"));
        graph.add(mid);

        let mut exe = target("exe", OutputType::Executable);
        exe.deps.push(label("mid"));
        graph.add(exe);

        assert!(graph.get(&label("mid")).configs.contains(&label("dconf")));
        assert!(!graph.get(&label("exe")).configs.contains(&label("dconf")));
    }

    #[test]
    fn forwarding_reexports_direct_dependent_configs() {
        let mut graph = TestGraph::default();
        graph.add_config(config_with_libs("dconf", &[]));

        let mut lib = target("lib", OutputType::StaticLibrary);
        lib.direct_dependent_configs.push(label("dconf"));
        graph.add(lib);

        let mut mid = target("mid", OutputType::StaticLibrary);
        mid.deps.push(label("lib"));
        mid.forward_dependent_configs.push(label("lib"));
        graph.add(mid);

        let mut exe = target("exe", OutputType::Executable);
        exe.deps.push(label("mid"));
        graph.add(exe);

        assert!(graph.get(&label("mid")).direct_dependent_configs.contains(&label("dconf")));
        assert!(graph.get(&label("exe")).configs.contains(&label("dconf")));
    }

    #[test]
    fn all_libs_order_is_own_then_configs_then_inherited() {
        let mut graph = TestGraph::default();
        graph.add_config(config_with_libs("conf", &["from_config"]));

        let mut lib = target("lib", OutputType::StaticLibrary);
        lib.config_values.libs.push("from_dep".to_owned());
        graph.add(lib);

        let mut exe = target("exe", OutputType::Executable);
        exe.config_values.libs.push("own".to_owned());
        exe.configs.push(label("conf"));
        exe.deps.push(label("lib"));
        graph.add(exe);

        let libs: Vec<_> = graph.get(&label("exe")).all_libs().iter().cloned().collect();
        assert_eq!(libs, ["own", "from_config", "from_dep"]);
    }

    #[test]
    fn group_members_appear_as_direct_deps() {
        let mut graph = TestGraph::default();
        graph.add(target("member", OutputType::StaticLibrary));

        let mut group = target("group", OutputType::Group);
        group.deps.push(label("member"));
        graph.add(group);

        let mut exe = target("exe", OutputType::Executable);
        exe.deps.push(label("group"));
        graph.add(exe);

        let exe = graph.get(&label("exe"));
        assert_eq!(exe.deps, vec![label("group"), label("member")]);
        assert!(exe.inherited_libraries().contains(&label("member")));
    }

    #[test]
    fn duplicate_deps_are_deduped_in_propagation() {
        let mut graph = TestGraph::default();
        let mut lib = target("lib", OutputType::StaticLibrary);
        lib.config_values.libs.push("z".to_owned());
        graph.add(lib);

        let mut exe = target("exe", OutputType::Executable);
        exe.deps.push(label("lib"));
        exe.deps.push(label("lib"));
        graph.add(exe);

        let exe = graph.get(&label("exe"));
        assert_eq!(exe.inherited_libraries().len(), 1);
        let libs: Vec<_> = exe.all_libs().iter().cloned().collect();
        assert_eq!(libs, ["z"]);
    }
}

//! Optimizer pass to specialize functions which are called with a closure
//! argument, when the closure is created right at the call site.
//!
//! The specialized function receives the captured values of the closure as
//! plain arguments and recreates the closure itself, which lets later passes
//! see through the closure and inline its body.

use std::collections::HashSet;

use petgraph::prelude::DiGraphMap;
use silt_errors::{Result, SimpleDiagnostic};
use silt_mangle::{ClosurePayload, FunctionSignatureSpecializationMangler, Mangler, SpecializationMangler};
use silt_sil::*;

use crate::pass::*;

#[derive(Debug, Default)]
pub(super) struct ClosureSpecializer {
    /// Number of specialized functions created by the pass.
    specialized: usize,
}

impl OptimizerPass for ClosureSpecializer {
    #[inline]
    fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn enabled(level: OptimizationLevel) -> bool {
        level.speed_level() >= 2
    }

    #[tracing::instrument(level = "DEBUG", skip_all, fields(module = %module.name))]
    fn execute(&mut self, module: &mut Module) -> Result<bool> {
        let mut changed = false;

        // Specialize bottom-up in the call graph, so callees are specialized
        // before any of their callers.
        for caller in bottom_up_order(module) {
            if module.expect_function(&caller)?.is_external_declaration() {
                continue;
            }

            changed |= self.specialize(module, &caller)?;
        }

        tracing::info!(
            target: "closure_specializer",
            specialized = self.specialized,
            "finished closure specialization"
        );

        Ok(changed)
    }
}

/// Describes a closure which is created by a `partial_apply` and passed
/// directly as an argument to an `apply`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ArgDescriptor {
    partial_apply: ValueId,
    apply: ValueId,

    /// Index of the closure within the arguments of the `apply`.
    closure_index: usize,
}

/// Values and types around a single call site, read from the caller.
struct CallSite {
    /// Name of the function which is called with the closure.
    callee: String,

    closure: ClosurePayload,

    /// Type of the closure created by the `partial_apply`.
    closure_ty: Type,

    /// Type of the function which the closure applies.
    closed_over_ty: Type,

    /// Values captured by the closure, in the caller.
    captured: Vec<ValueId>,
}

impl ClosureSpecializer {
    fn specialize(&mut self, module: &mut Module, caller_name: &str) -> Result<bool> {
        tracing::debug!(
            target: "closure_specializer",
            caller = caller_name,
            "optimizing call sites which take a closure argument"
        );

        let (descriptors, multiple_closures) = gather_call_sites(module, module.expect_function(caller_name)?);
        let mut changed = false;

        for desc in descriptors {
            // Applies which take multiple closures are not specialized.
            if multiple_closures.contains(&desc.apply) {
                continue;
            }

            let site = read_call_site(module.expect_function(caller_name)?, desc)?;
            let callee = module.expect_function(&site.callee)?;
            let name = specialized_name(callee, desc.closure_index, site.closure.clone());

            tracing::debug!(target: "closure_specializer", name = %name, "specializing call site");

            if !module.contains_function(&name) {
                let cloned = clone_callee(callee, &name, desc.closure_index, &site);

                module.add_function(cloned)?;
                self.specialized += 1;
            }

            let specialized_ty = module.expect_function(&name)?.ty();

            let caller = module.expect_function_mut(caller_name)?;
            rewrite_apply(caller, desc, &site, name, specialized_ty)?;

            changed = true;
        }

        Ok(changed)
    }
}

/// Orders the functions within the module, such that callees come before
/// their callers. Functions within a cycle are ordered arbitrarily.
fn bottom_up_order(module: &Module) -> Vec<String> {
    let mut graph = DiGraphMap::<&str, ()>::new();

    for func in module.functions() {
        graph.add_node(func.name.as_str());
    }

    for func in module.functions() {
        for (_, inst) in func.instructions() {
            if let InstructionKind::FunctionRef { function } = &inst.kind
                && module.contains_function(function)
            {
                graph.add_edge(func.name.as_str(), function.as_str(), ());
            }
        }
    }

    // Strongly connected components are returned in reverse topological order.
    petgraph::algo::tarjan_scc(&graph)
        .into_iter()
        .flatten()
        .map(ToString::to_string)
        .collect()
}

/// Finds all closures in `caller` which can be specialized into the function
/// they are passed to.
///
/// Also returns the set of `apply` instructions which take more than a single
/// closure, since those cannot be specialized.
fn gather_call_sites(module: &Module, caller: &Function) -> (Vec<ArgDescriptor>, HashSet<ValueId>) {
    let mut call_sites = Vec::new();
    let mut visited = HashSet::new();
    let mut multiple_closures = HashSet::new();

    for (_, inst) in caller.instructions() {
        let InstructionKind::PartialApply {
            callee,
            arguments: captured,
            substitutions,
        } = &inst.kind
        else {
            continue;
        };

        if !substitutions.is_empty() {
            continue;
        }

        // The closure must apply a known function, which takes at least as
        // many parameters as the closure captures.
        if caller.referenced_function(*callee).is_none()
            || caller.value_ty(*callee).function_parameters().len() < captured.len()
        {
            continue;
        }

        if caller.use_count(inst.result) != 1 {
            continue;
        }

        let Some((_, user)) = caller.users(inst.result).next() else {
            continue;
        };

        let InstructionKind::Apply {
            callee: apply_callee,
            arguments,
            substitutions,
        } = &user.kind
        else {
            continue;
        };

        if !substitutions.is_empty() {
            continue;
        }

        if !visited.insert(user.result) {
            multiple_closures.insert(user.result);
            continue;
        }

        let Some(callee_name) = caller.referenced_function(*apply_callee) else {
            continue;
        };

        let callee = match module.function(callee_name) {
            Some(callee) if !callee.is_external_declaration() => callee,
            _ => continue,
        };

        let Some(closure_index) = arguments.iter().position(|arg| *arg == inst.result) else {
            continue;
        };

        if closure_index >= callee.signature.parameters.len() {
            continue;
        }

        tracing::debug!(
            target: "closure_specializer",
            index = closure_index,
            "found call site with closure argument: {user}"
        );

        call_sites.push(ArgDescriptor {
            partial_apply: inst.result,
            apply: user.result,
            closure_index,
        });
    }

    (call_sites, multiple_closures)
}

fn read_call_site(caller: &Function, desc: ArgDescriptor) -> Result<CallSite> {
    let apply = expect_instruction(caller, desc.apply)?;
    let partial_apply = expect_instruction(caller, desc.partial_apply)?;

    let InstructionKind::Apply { callee, .. } = &apply.kind else {
        return Err(SimpleDiagnostic::new(format!("expected apply instruction, found {apply}")).into());
    };

    let InstructionKind::PartialApply {
        callee: closed_over,
        arguments: captured,
        ..
    } = &partial_apply.kind
    else {
        return Err(SimpleDiagnostic::new(format!("expected partial_apply instruction, found {partial_apply}")).into());
    };

    let Some(callee) = caller.referenced_function(*callee) else {
        return Err(SimpleDiagnostic::new(format!("callee of {apply} is not a function reference")).into());
    };

    Ok(CallSite {
        callee: callee.to_string(),
        closure: ClosurePayload::from_partial_apply(caller, partial_apply),
        closure_ty: caller.value_ty(partial_apply.result).clone(),
        closed_over_ty: caller.value_ty(*closed_over).clone(),
        captured: captured.clone(),
    })
}

fn expect_instruction(func: &Function, value: ValueId) -> Result<&Instruction> {
    func.defining_instruction(value).ok_or_else(|| {
        SimpleDiagnostic::new(format!("no instruction defines {value} in {}", func.name)).into()
    })
}

/// Creates the name of the function which `callee` is specialized into, when
/// the argument at `closure_index` is replaced by `closure`.
fn specialized_name(callee: &Function, closure_index: usize, closure: ClosurePayload) -> String {
    let mut mangler = Mangler::new();

    let mut fssm = FunctionSignatureSpecializationMangler::new(&mut mangler, callee);
    fssm.set_argument_closure_prop(closure_index, closure);
    fssm.mangle();

    mangler.finalize()
}

/// Clones `callee` into a new function named `name`, where the closure
/// parameter is replaced by the values which the closure captures.
fn clone_callee(callee: &Function, name: &str, closure_index: usize, site: &CallSite) -> Function {
    let closed_over_params = site.closed_over_ty.function_parameters();
    let captured_params = &closed_over_params[closed_over_params.len() - site.captured.len()..];

    let mut parameters = callee.signature.parameters.clone();
    parameters.remove(closure_index);
    parameters.extend_from_slice(captured_params);

    let mut cloned = callee.clone();
    cloned.name = name.to_string();
    cloned.signature = Signature::new(parameters, callee.signature.result.clone());

    let closure_param = cloned.block_mut(BlockId::ENTRY).arguments_mut().remove(closure_index);

    let captured = captured_params
        .iter()
        .map(|ty| cloned.add_block_argument(BlockId::ENTRY, ty.clone()))
        .collect::<Vec<_>>();

    // Recreate the closure at the start of the function, from the captured
    // values which are now passed as arguments.
    let closed_over = cloned.add_value(site.closed_over_ty.clone());
    let closure = cloned.add_value(site.closure_ty.clone());

    cloned.replace_all_uses(closure_param, closure);

    cloned.insert_instruction(
        InstLocation {
            block: BlockId::ENTRY,
            index: 0,
        },
        Instruction {
            result: closed_over,
            kind: InstructionKind::FunctionRef {
                function: site.closure.callee.clone(),
            },
        },
    );

    cloned.insert_instruction(
        InstLocation {
            block: BlockId::ENTRY,
            index: 1,
        },
        Instruction {
            result: closure,
            kind: InstructionKind::PartialApply {
                callee: closed_over,
                arguments: captured,
                substitutions: Vec::new(),
            },
        },
    );

    cloned
}

/// Rewrites the `apply` of the call site to call the specialized function,
/// passing the captured values instead of the closure.
///
/// The `partial_apply` which created the closure is removed, if it has no
/// remaining uses.
fn rewrite_apply(
    caller: &mut Function,
    desc: ArgDescriptor,
    site: &CallSite,
    specialized_name: String,
    specialized_ty: Type,
) -> Result<()> {
    let Some(loc) = caller.find_instruction(desc.apply) else {
        return Err(SimpleDiagnostic::new(format!("no instruction defines {} in {}", desc.apply, caller.name)).into());
    };

    let InstructionKind::Apply { arguments, .. } = &caller.instruction(loc).kind else {
        let found = caller.instruction(loc);

        return Err(SimpleDiagnostic::new(format!("expected apply instruction, found {found}")).into());
    };

    let arguments = arguments
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != desc.closure_index)
        .map(|(_, arg)| *arg)
        .chain(site.captured.iter().copied())
        .collect::<Vec<_>>();

    let specialized_ref = caller.add_value(specialized_ty);

    caller.insert_instruction(
        loc,
        Instruction {
            result: specialized_ref,
            kind: InstructionKind::FunctionRef {
                function: specialized_name,
            },
        },
    );

    let apply_loc = InstLocation {
        block: loc.block,
        index: loc.index + 1,
    };

    caller.instruction_mut(apply_loc).kind = InstructionKind::Apply {
        callee: specialized_ref,
        arguments,
        substitutions: Vec::new(),
    };

    if caller.use_count(desc.partial_apply) == 0
        && let Some(loc) = caller.find_instruction(desc.partial_apply)
    {
        caller.remove_instruction(loc);
    }

    Ok(())
}

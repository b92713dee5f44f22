//! Read-only traversal over the AST.
//!
//! Implementors override the `visit_*` hooks they care about and call the
//! matching `walk_*` function to keep descending.

use super::*;

pub trait Visit {
    fn visit_program(&mut self, program: &Program) {
        walk_program(self, program);
    }

    fn visit_module_item(&mut self, item: &Node<ModuleItem>) {
        walk_module_item(self, item);
    }

    fn visit_stmt(&mut self, stmt: &Node<Stmt>) {
        walk_stmt(self, stmt);
    }

    fn visit_decl(&mut self, decl: &Decl) {
        walk_decl(self, decl);
    }

    fn visit_expr(&mut self, expr: &Node<Expr>) {
        walk_expr(self, expr);
    }

    fn visit_pattern(&mut self, pattern: &Node<Pattern>) {
        walk_pattern(self, pattern);
    }

    fn visit_function(&mut self, function: &Function) {
        walk_function(self, function);
    }

    fn visit_class(&mut self, class: &Class) {
        walk_class(self, class);
    }
}

pub fn walk_program<V: Visit + ?Sized>(v: &mut V, program: &Program) {
    for item in &program.items {
        v.visit_module_item(item);
    }
}

pub fn walk_module_item<V: Visit + ?Sized>(v: &mut V, item: &Node<ModuleItem>) {
    match &item.value {
        ModuleItem::Import(_) => {}
        ModuleItem::Export(export) => match export {
            ExportDecl::Named { .. } | ExportDecl::All { .. } => {}
            ExportDecl::Default(expr) => v.visit_expr(expr),
            ExportDecl::DefaultDecl(decl) | ExportDecl::Decl(decl) => v.visit_decl(&decl.value),
        },
        ModuleItem::Stmt(stmt) => v.visit_stmt(stmt),
    }
}

fn walk_block<V: Visit + ?Sized>(v: &mut V, block: &BlockStmt) {
    for stmt in &block.stmts {
        v.visit_stmt(stmt);
    }
}

fn walk_var_decl<V: Visit + ?Sized>(v: &mut V, var: &VarDecl) {
    for declarator in &var.declarations {
        v.visit_pattern(&declarator.pattern);
        if let Some(init) = &declarator.init {
            v.visit_expr(init);
        }
    }
}

fn walk_for_left<V: Visit + ?Sized>(v: &mut V, left: &ForInLeft) {
    match left {
        ForInLeft::VarDecl(var) => walk_var_decl(v, var),
        ForInLeft::Pattern(pattern) => v.visit_pattern(pattern),
    }
}

pub fn walk_stmt<V: Visit + ?Sized>(v: &mut V, stmt: &Node<Stmt>) {
    match &stmt.value {
        Stmt::Expr(expr) | Stmt::Throw(expr) => v.visit_expr(expr),
        Stmt::Decl(decl) => v.visit_decl(decl),
        Stmt::Return(arg) => {
            if let Some(arg) = arg {
                v.visit_expr(arg);
            }
        }
        Stmt::If {
            condition,
            then_stmt,
            else_stmt,
        } => {
            v.visit_expr(condition);
            v.visit_stmt(then_stmt);
            if let Some(else_stmt) = else_stmt {
                v.visit_stmt(else_stmt);
            }
        }
        Stmt::For {
            init,
            condition,
            update,
            body,
        } => {
            match init {
                Some(ForInit::VarDecl(var)) => walk_var_decl(v, var),
                Some(ForInit::Expr(expr)) => v.visit_expr(expr),
                None => {}
            }
            if let Some(condition) = condition {
                v.visit_expr(condition);
            }
            if let Some(update) = update {
                v.visit_expr(update);
            }
            v.visit_stmt(body);
        }
        Stmt::ForIn { left, right, body } | Stmt::ForOf { left, right, body, .. } => {
            walk_for_left(v, left);
            v.visit_expr(right);
            v.visit_stmt(body);
        }
        Stmt::While { condition, body } | Stmt::DoWhile { body, condition } => {
            v.visit_expr(condition);
            v.visit_stmt(body);
        }
        Stmt::Block(block) => walk_block(v, block),
        Stmt::Try {
            block,
            catch,
            finally,
        } => {
            walk_block(v, &block.value);
            if let Some(catch) = catch {
                if let Some(param) = &catch.param {
                    v.visit_pattern(param);
                }
                walk_block(v, &catch.body.value);
            }
            if let Some(finally) = finally {
                walk_block(v, &finally.value);
            }
        }
        Stmt::Switch {
            discriminant,
            cases,
        } => {
            v.visit_expr(discriminant);
            for case in cases {
                if let Some(test) = &case.test {
                    v.visit_expr(test);
                }
                for stmt in &case.consequent {
                    v.visit_stmt(stmt);
                }
            }
        }
        Stmt::Labeled { stmt, .. } => v.visit_stmt(stmt),
        Stmt::Break(_) | Stmt::Continue(_) | Stmt::Empty | Stmt::Debugger => {}
    }
}

pub fn walk_decl<V: Visit + ?Sized>(v: &mut V, decl: &Decl) {
    match decl {
        Decl::Function(function) => v.visit_function(function),
        Decl::Class(class) => v.visit_class(class),
        Decl::Var(var) => walk_var_decl(v, var),
    }
}

fn walk_property_name<V: Visit + ?Sized>(v: &mut V, key: &PropertyName) {
    if let PropertyName::Computed(expr) = key {
        v.visit_expr(expr);
    }
}

fn walk_params<V: Visit + ?Sized>(v: &mut V, params: &[Param]) {
    for param in params {
        v.visit_pattern(&param.pattern);
    }
}

pub fn walk_expr<V: Visit + ?Sized>(v: &mut V, expr: &Node<Expr>) {
    match &expr.value {
        Expr::Literal(_) | Expr::Ident(_) | Expr::This | Expr::Super => {}
        Expr::MetaProperty { .. } => {}
        Expr::Binary { left, right, .. } => {
            v.visit_expr(left);
            v.visit_expr(right);
        }
        Expr::Assignment { target, value, .. } => {
            v.visit_expr(target);
            v.visit_expr(value);
        }
        Expr::Unary { expr, .. }
        | Expr::Await(expr)
        | Expr::Paren(expr)
        | Expr::Spread(expr) => v.visit_expr(expr),
        Expr::Call { callee, args }
        | Expr::New { callee, args }
        | Expr::OptionalCall { callee, args } => {
            v.visit_expr(callee);
            for arg in args {
                v.visit_expr(arg);
            }
        }
        Expr::Member { object, .. } | Expr::OptionalMember { object, .. } => {
            v.visit_expr(object)
        }
        Expr::Index { object, index } | Expr::OptionalIndex { object, index } => {
            v.visit_expr(object);
            v.visit_expr(index);
        }
        Expr::Array(elements) => {
            for element in elements.iter().flatten() {
                v.visit_expr(element);
            }
        }
        Expr::Object(properties) => {
            for property in properties {
                match property {
                    ObjectProperty::Property { key, value, .. } => {
                        walk_property_name(v, key);
                        v.visit_expr(value);
                    }
                    ObjectProperty::Method { key, function, .. } => {
                        walk_property_name(v, key);
                        v.visit_function(function);
                    }
                    ObjectProperty::Spread(expr) => v.visit_expr(expr),
                }
            }
        }
        Expr::Arrow { params, body, .. } => {
            walk_params(v, params);
            match body {
                ArrowBody::Expr(expr) => v.visit_expr(expr),
                ArrowBody::Block(block) => walk_block(v, &block.value),
            }
        }
        Expr::Function(function) => v.visit_function(function),
        Expr::Class(class) => v.visit_class(class),
        Expr::Ternary {
            condition,
            then_expr,
            else_expr,
        } => {
            v.visit_expr(condition);
            v.visit_expr(then_expr);
            v.visit_expr(else_expr);
        }
        Expr::Template(template) => {
            for expr in &template.exprs {
                v.visit_expr(expr);
            }
        }
        Expr::TaggedTemplate { tag, template } => {
            v.visit_expr(tag);
            for expr in &template.exprs {
                v.visit_expr(expr);
            }
        }
        Expr::Yield { argument, .. } => {
            if let Some(argument) = argument {
                v.visit_expr(argument);
            }
        }
        Expr::Sequence(exprs) => {
            for expr in exprs {
                v.visit_expr(expr);
            }
        }
    }
}

pub fn walk_pattern<V: Visit + ?Sized>(v: &mut V, pattern: &Node<Pattern>) {
    match &pattern.value {
        Pattern::Ident(_) => {}
        Pattern::Array { elements, rest } => {
            for element in elements.iter().flatten() {
                v.visit_pattern(element);
            }
            if let Some(rest) = rest {
                v.visit_pattern(rest);
            }
        }
        Pattern::Object { properties, rest } => {
            for property in properties {
                walk_property_name(v, &property.key);
                v.visit_pattern(&property.value);
            }
            if let Some(rest) = rest {
                v.visit_pattern(rest);
            }
        }
        Pattern::Assignment { pattern, default } => {
            v.visit_pattern(pattern);
            v.visit_expr(default);
        }
        Pattern::Expr(expr) => v.visit_expr(expr),
    }
}

pub fn walk_function<V: Visit + ?Sized>(v: &mut V, function: &Function) {
    walk_params(v, &function.params);
    walk_block(v, &function.body.value);
}

pub fn walk_class<V: Visit + ?Sized>(v: &mut V, class: &Class) {
    if let Some(extends) = &class.extends {
        v.visit_expr(extends);
    }
    for member in &class.members {
        match member {
            ClassMember::Constructor { params, body } => {
                walk_params(v, params);
                walk_block(v, &body.value);
            }
            ClassMember::Method { key, function, .. } => {
                walk_property_name(v, key);
                v.visit_function(function);
            }
            ClassMember::Property { key, value, .. } => {
                walk_property_name(v, key);
                if let Some(value) = value {
                    v.visit_expr(value);
                }
            }
            ClassMember::StaticBlock(block) => walk_block(v, &block.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct IdentCounter(usize);

    impl Visit for IdentCounter {
        fn visit_expr(&mut self, expr: &Node<Expr>) {
            if let Expr::Ident(_) = expr.value {
                self.0 += 1;
            }
            walk_expr(self, expr);
        }
    }

    #[test]
    fn test_walk_reaches_nested_expressions() {
        let span = Span::new(0, 0);
        let ident = |name: &str| Node::new(Expr::Ident(Ident::new(name)), span);
        // f(a, b + c)
        let call = Node::new(
            Expr::Call {
                callee: Box::new(ident("f")),
                args: vec![
                    ident("a"),
                    Node::new(
                        Expr::Binary {
                            left: Box::new(ident("b")),
                            op: BinaryOp::Add,
                            right: Box::new(ident("c")),
                        },
                        span,
                    ),
                ],
            },
            span,
        );
        let program = Program {
            items: vec![Node::new(
                ModuleItem::Stmt(Node::new(Stmt::Expr(call), span)),
                span,
            )],
            span,
        };

        let mut counter = IdentCounter(0);
        counter.visit_program(&program);
        assert_eq!(counter.0, 4);
    }
}
